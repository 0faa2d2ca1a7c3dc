//! `#[timed_test]`: the workspace's `#[test]` replacement.
//!
//! Prints how long each test took and fails tests that blow through their
//! timeout (default 1 second; pass an integer for a custom budget in
//! seconds, e.g. `#[timed_test(30)]` for slow integration tests).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

#[proc_macro_attribute]
pub fn timed_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let timeout_secs: u64 = if attr.is_empty() {
        1
    } else {
        parse_macro_input!(attr as LitInt)
            .base10_parse()
            .expect("timed_test takes an integer timeout in seconds")
    };

    let test_fn = parse_macro_input!(item as ItemFn);
    let attrs = &test_fn.attrs;
    let vis = &test_fn.vis;
    let name = &test_fn.sig.ident;
    let body = &test_fn.block;

    quote! {
        #(#attrs)*
        #[test]
        #vis fn #name() {
            let start = ::std::time::Instant::now();
            let outcome = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| #body));
            let elapsed_ms = start.elapsed().as_millis();

            eprintln!("[timed_test] {}: {elapsed_ms} ms", stringify!(#name));

            if let Err(payload) = outcome {
                ::std::panic::resume_unwind(payload);
            }
            assert!(
                elapsed_ms < u128::from(#timeout_secs) * 1000,
                "{} exceeded its {}s budget ({elapsed_ms} ms)",
                stringify!(#name),
                #timeout_secs,
            );
        }
    }
    .into()
}
