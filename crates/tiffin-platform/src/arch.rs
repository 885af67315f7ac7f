use std::env;

/// The label manifests use to select per-architecture artifacts.
///
/// Manifests may rename this per source via `architectureNames`; absent an
/// override the label is used verbatim.
pub fn host_arch() -> &'static str {
    env::consts::ARCH
}
