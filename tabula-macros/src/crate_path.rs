//! Crate path resolution for generated code.
//!
//! Detects whether the user depends on `tabula` (facade) or `tabula-core`
//! directly, and returns the appropriate path prefix for generated code.

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;

/// Returns the token stream for accessing `tabula_core` types.
///
/// If the user depends on `tabula`, returns `::tabula`.
/// Otherwise returns `::tabula_core`.
///
/// Inside either crate (its doctests and integration tests included) the
/// absolute path is kept; both crates alias themselves with
/// `extern crate self`.
pub fn tabula_core_path() -> TokenStream {
    for candidate in ["tabula", "tabula-core"] {
        if let Ok(found) = crate_name(candidate) {
            let name = match found {
                FoundCrate::Itself => candidate.replace('-', "_"),
                FoundCrate::Name(name) => name,
            };
            let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
            return quote!(::#ident);
        }
    }
    // Fallback - assume tabula_core is available (for error messages)
    quote!(::tabula_core)
}
