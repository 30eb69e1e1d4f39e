use std::env;
use std::path::PathBuf;

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

/// FFmpeg install location inside a vcpkg tree, if `VCPKG_ROOT` is set.
fn vcpkg_install() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // Linux and macOS resolve FFmpeg through pkg-config; only Windows needs
    // a hint.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows"
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    match vcpkg_install() {
        None => println!(
            "cargo:warning=vidshelf links FFmpeg; set FFMPEG_DIR (or VCPKG_ROOT with an ffmpeg port installed) to build on Windows."
        ),
        Some(directory) if directory.exists() => {
            println!(
                "cargo:warning=Found vcpkg FFmpeg at {0}. Set FFMPEG_DIR={0} to make discovery explicit.",
                directory.display(),
            );
            if env::var_os("VCPKGRS_DYNAMIC").is_none() {
                println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if this is a dynamic FFmpeg build.");
            }
        }
        Some(directory) => println!(
            "cargo:warning=VCPKG_ROOT is set but {} holds no FFmpeg install.",
            directory.display(),
        ),
    }
}
