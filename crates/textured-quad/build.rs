use std::{env, fs, path};

fn main() {
    println!("cargo::rerun-if-changed=shaders/");

    copy_shaders("quad.hlsl");
}

// shaders are compiled at runtime, next to the executable
fn copy_shaders(shader: &str) {
    let Ok(out_dir) = env::var("OUT_DIR") else {
        println!("cargo::warning=OUT_DIR is not set, skipping {shader}");
        return;
    };
    let out_dir = path::Path::new(&out_dir).join("../../../shaders/");

    if let Err(e) = fs::create_dir_all(&out_dir) {
        println!("cargo::warning=Failed to create {}: {e}", out_dir.display());
        return;
    }

    let src = path::Path::new(&env::var("CARGO_MANIFEST_DIR").unwrap_or_default())
        .join("shaders")
        .join(shader);
    let dst = out_dir.join(shader);

    if let Err(e) = fs::copy(&src, &dst) {
        println!("cargo::warning=Failed to copy {}: {e}", src.display());
    }
}
