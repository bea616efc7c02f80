// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates Kubernetes CRD YAML files from the Rust types defined in
//! src/crd.rs, so the manifests under deploy/crds/ are always in sync with
//! the code.
//!
//! Usage:
//!   cargo run --bin crdgen
//!   cargo run --bin crdgen -- --stdout

use app_operator::crd::{App, Catalog, Chart};
use clap::Parser;
use kube::CustomResourceExt;
use std::fs;
use std::path::{Path, PathBuf};

const HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

/// Generate CRD manifests for the App Operator.
#[derive(Parser)]
#[command(name = "crdgen", version, about)]
struct Args {
    /// Directory the manifests are written to.
    #[arg(long, default_value = "deploy/crds")]
    out_dir: PathBuf,

    /// Print all manifests to stdout instead of writing files.
    #[arg(long)]
    stdout: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.stdout {
        print!("{}", render_crd::<App>()?);
        print!("---\n{}", render_crd::<Catalog>()?);
        print!("---\n{}", render_crd::<Chart>()?);
        return Ok(());
    }

    fs::create_dir_all(&args.out_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");

    write_crd::<App>("apps.crd.yaml", &args.out_dir)?;
    write_crd::<Catalog>("catalogs.crd.yaml", &args.out_dir)?;
    write_crd::<Chart>("charts.crd.yaml", &args.out_dir)?;

    println!(
        "Successfully generated CRD YAML files in {}",
        args.out_dir.display()
    );
    println!("\nNext steps:");
    println!("  1. Review the generated files");
    println!("  2. Deploy with: kubectl apply -f {}", args.out_dir.display());

    Ok(())
}

fn render_crd<K: CustomResourceExt>() -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_yaml::to_string(&K::crd())?)
}

fn write_crd<K: CustomResourceExt>(
    file_name: &str,
    out_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml = render_crd::<K>()?;
    let path = out_dir.join(file_name);
    fs::write(&path, format!("{HEADER}{yaml}"))?;
    println!("  wrote {}", path.display());
    Ok(())
}
