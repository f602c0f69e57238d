/// Version of the software: the Cargo package version, with the git commit
/// appended when `REFMAP_GIT_HASH` was set at build time.
pub static VERSION: std::sync::LazyLock<String> = std::sync::LazyLock::new(|| {
    let pkg = env!("CARGO_PKG_VERSION");
    match option_env!("REFMAP_GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{pkg}-{hash}"),
        _ => pkg.to_string(),
    }
});
