use std::{env, fs, io::Write, path::PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Development signing key pair
    let certs_dir = PathBuf::from("certs");
    let priv_path = certs_dir.join("private_key.pem");
    let cert_path = certs_dir.join("public_cert.pem");
    println!("cargo:rustc-check-cfg=cfg(has_dev_keys)");
    println!("cargo:rerun-if-changed={}", priv_path.display());
    println!("cargo:rerun-if-changed={}", cert_path.display());
    if priv_path.exists() && cert_path.exists() {
        let priv_contents = fs::read_to_string(&priv_path).unwrap();
        let cert_contents = fs::read_to_string(&cert_path).unwrap();
        let mut out_file = fs::File::create(out_dir.join("dev_keys.rs")).unwrap();
        write!(
            out_file,
            "pub const DEV_PRIVATE_KEY: &str = r#\"{}\"#;\npub const DEV_CERTIFICATE: &str = r#\"{}\"#;\n",
            priv_contents, cert_contents
        )
        .unwrap();
        println!("cargo:rustc-cfg=has_dev_keys");
    }

    // Binary delta payloads, distributed out-of-band
    let resources_dir = PathBuf::from("resources");
    let pnsovr_path = resources_dir.join("libpnsovr_patch.bin");
    let r15_path = resources_dir.join("libr15_patch.bin");
    println!("cargo:rustc-check-cfg=cfg(has_embedded_patches)");
    println!("cargo:rerun-if-changed={}", pnsovr_path.display());
    println!("cargo:rerun-if-changed={}", r15_path.display());
    if pnsovr_path.exists() && r15_path.exists() {
        let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
        let mut out_file = fs::File::create(out_dir.join("embedded_patches.rs")).unwrap();
        write!(
            out_file,
            "pub const PNSOVR_PATCH: Option<&[u8]> = Some(include_bytes!(r\"{}\").as_slice());\n\
             pub const R15_PATCH: Option<&[u8]> = Some(include_bytes!(r\"{}\").as_slice());\n",
            manifest_dir.join(&pnsovr_path).display(),
            manifest_dir.join(&r15_path).display()
        )
        .unwrap();
        println!("cargo:rustc-cfg=has_embedded_patches");
    } else {
        println!(
            "cargo:warning=resources/libpnsovr_patch.bin and resources/libr15_patch.bin not found; \
             the binary will report missing patch payloads at startup"
        );
    }
}
