use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Marks a test function.
///
/// Sync tests expand to a plain `#[test]`. Async tests are driven on a
/// current-thread tokio runtime inside a `LocalSet`, so `!Send` futures and
/// `tokio::task::spawn_local` work the same way they do for a single-threaded
/// hub connection.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(raw_args.span(), "srrx_macro::test does not take arguments")
        .to_compile_error(),
    );
  }

  let mut input = parse_macro_input!(item as ItemFn);
  if input.sig.asyncness.is_none() {
    return TokenStream::from(quote! {
      #[test]
      #input
    });
  }

  input.sig.asyncness = None;
  let attrs = &input.attrs;
  let vis = &input.vis;
  let sig = &input.sig;
  let body = &input.block;

  let expanded = quote! {
    #[test]
    #(#attrs)*
    #vis #sig {
      let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build the test runtime");
      tokio::task::LocalSet::new().block_on(&runtime, async move #body)
    }
  };

  TokenStream::from(expanded)
}
