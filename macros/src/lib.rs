// eventlets-macros/src/lib.rs
extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Builds the argument list handed to the underlying tokio attribute.
///
/// Eventlets are `!Send` and the default hub schedules through
/// `tokio::task::spawn_local`, so the runtime is always current-thread.
/// Any user arguments (e.g. `start_paused = true`) are appended.
fn runtime_args(attr: TokenStream) -> proc_macro2::TokenStream {
  let user_args = proc_macro2::TokenStream::from(attr);
  if user_args.is_empty() {
    quote! { flavor = "current_thread" }
  } else {
    quote! { flavor = "current_thread", #user_args }
  }
}

/// Rejects non-async functions with a spanned compile error.
fn require_async(input_fn: &ItemFn, attr_name: &str) -> Option<TokenStream> {
  if input_fn.sig.asyncness.is_some() {
    return None;
  }
  let error_msg = format!("`#[eventlets::{}]` attribute can only be used on `async` functions", attr_name);
  Some(
    syn::Error::new_spanned(&input_fn.sig.fn_token, error_msg)
      .to_compile_error()
      .into(),
  )
}

/// Runs an `async fn main` on a current-thread tokio runtime inside a
/// `tokio::task::LocalSet`, which is what the default `TokioHub` needs to
/// schedule eventlets.
///
/// Arguments are forwarded to `#[tokio::main]`. A panic that escaped an
/// eventlet during the run (see `FailurePolicy::Propagate`) is re-raised once
/// the body has finished.
///
/// # Example
/// ```ignore
/// #[eventlets::main]
/// async fn main() {
///   let e = eventlets::spawn(async { println!("hello from an eventlet") });
///   tokio::time::sleep(std::time::Duration::from_millis(10)).await;
///   assert!(!e.alive());
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input_fn = parse_macro_input!(item as ItemFn);
  if let Some(error) = require_async(&input_fn, "main") {
    return error;
  }

  let fn_vis = &input_fn.vis;
  let fn_sig = &input_fn.sig;
  let fn_block = &input_fn.block;
  let fn_attrs = &input_fn.attrs;
  let args = runtime_args(attr);

  let expanded_code = quote! {
      #(#fn_attrs)*
      #[tokio::main(#args)]
      #fn_vis #fn_sig {
        let body_result = tokio::task::LocalSet::new().run_until(async move #fn_block).await;
        ::eventlets::runtime::resume_escaped_panic();
        body_result
      }
  };

  TokenStream::from(expanded_code)
}

/// Attribute macro for `async` tests that drive eventlets.
///
/// Expands to `#[tokio::test(flavor = "current_thread", ..)]` with the body
/// wrapped in a `LocalSet`, re-raising any panic that escaped an eventlet
/// once the body has finished. Use `#[eventlets::test(start_paused = true)]` for
/// tests that reason about timers; it needs tokio's `test-util` feature.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input_fn = parse_macro_input!(item as ItemFn);
  if let Some(error) = require_async(&input_fn, "test") {
    return error;
  }

  let fn_vis = &input_fn.vis;
  let fn_sig = &input_fn.sig;
  let fn_block = &input_fn.block;
  let fn_attrs = &input_fn.attrs; // Keep other attributes like `#[should_panic]`
  let args = runtime_args(attr);

  let expanded_code = quote! {
      #(#fn_attrs)*
      #[tokio::test(#args)]
      #fn_vis #fn_sig {
        let body_result = tokio::task::LocalSet::new().run_until(async move #fn_block).await;
        ::eventlets::runtime::resume_escaped_panic();
        body_result
      }
  };

  TokenStream::from(expanded_code)
}
