/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! # EchoPatch Library
//!
//! Patches the Echo VR Quest APK: verifies the input is the one supported
//! build, injects a validated service-endpoint `config.json`, applies
//! precomputed binary deltas to the two native libraries, then repacks and
//! signs the archive. It provides the core functionality for the `echopatch`
//! command-line tool.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod endpoints;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod patch;
pub mod patcher;
pub mod pipeline;
pub mod profile;
pub mod resources;
pub mod signing;
pub mod ui;
pub mod verification;

pub const APP_NAME: &str = "EchoPatch";
pub const APP_BIN_NAME: &str = "echopatch";
pub const APP_VERSION: &str = "1.0.0";
pub const APP_ABOUT: &str =
    "Patches the Echo VR Quest APK with custom service endpoints and signs the result.";
pub const BUFFER_SIZE: usize = 64 * 1024;

/// MD5 of the one supported APK build (goldmaster store build, version 4987566).
pub const EXPECTED_APK_MD5: &str = "c14c0f68adb62a4c5deaef46d046f872";

/// File name of the final signed artifact, written beside the input APK.
pub const OUTPUT_APK_NAME: &str = "r15_goldmaster_store_patched.apk";

/// Endpoint config file name, looked up beside the input APK.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Destination of the injected config inside the extracted tree.
pub const CONFIG_DEST_PATH: &str = "assets/_local/config.json";

pub const PNSOVR_LIB_PATH: &str = "lib/arm64-v8a/libpnsovr.so";
pub const R15_LIB_PATH: &str = "lib/arm64-v8a/libr15.so";

pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";
pub const CERT_SF_NAME: &str = "META-INF/CERT.SF";
pub const CERT_RSA_NAME: &str = "META-INF/CERT.RSA";

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
