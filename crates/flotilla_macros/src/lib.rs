use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a simulation stage when the `perf_stats` feature is enabled.
///
/// The function body is wrapped with a guard that logs the elapsed time
/// when the stage returns. With `perf_stats` disabled the guard is not
/// emitted at all.
///
/// # Features
/// - Auto-detects a `ctx: &mut SimContext` (or `&SimContext`) parameter and
///   reads the current tick from it for tick-based logging
/// - Logs when duration exceeds the threshold OR every 100 ticks (if a
///   context is available)
/// - Uses Bevy's `info!` logging
///
/// # Example
/// ```ignore
/// #[profile]
/// pub fn move_objects(ctx: &mut SimContext, units: i32) -> Result<(), SimError> {
///     // ... work ...
/// }
/// ```
///
/// # Optional Parameters
/// ```ignore
/// #[profile(2)]  // Custom threshold in milliseconds
/// pub fn collide_objects(ctx: &mut SimContext) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_context_param = sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        let ty = &pat_type.ty;
        pat_ident.ident == "ctx" && quote!(#ty).to_string().contains("SimContext")
    });

    let profile_guard_def = if has_context_param {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
                tick_value: u64,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms || (self.tick_value % 100 == 0) {
                        bevy::log::info!("[PERF] {} (tick {}): {:?}", self.name, self.tick_value, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
                tick_value: ctx.tick.0,
            }
        }
    } else {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms {
                        bevy::log::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
            }
        }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #profile_guard_def
            };

            #block
        }
    };

    output.into()
}
