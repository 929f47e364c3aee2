//! 3MF Import Tool
//!
//! Imports a 3MF file into an in-memory scene and reports what was created.
//! Useful for checking how a file will come out in a host before opening it
//! there.

#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use threemf_import::scene::SceneMesh;
use threemf_import::{ImportConfig, MemoryScene, import_with_config};

/// Command-line arguments for the 3MF import tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the 3MF file to import
    #[arg(value_name = "FILE")]
    file_path: PathBuf,

    /// Log debug output (per-mesh counts, unresolved references)
    #[arg(short, long)]
    verbose: bool,

    /// Fail on components and unknown objects instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Name of the UV layer textured meshes are written to
    #[arg(long, value_name = "NAME", default_value = "UVMap")]
    uv_layer: String,

    /// Print the import summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = ImportConfig::new()
        .with_strict_objects(args.strict)
        .with_uv_layer_name(args.uv_layer.clone());

    let mut scene = MemoryScene::new();
    let summary = match import_with_config(&args.file_path, &mut scene, &config) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Failed to import 3MF file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{}", summary);
    if summary.unresolved_triangles > 0 {
        println!(
            "{} triangles reference unknown property groups",
            summary.unresolved_triangles
        );
    }
    println!();

    for object in scene.objects() {
        let Some(mesh) = scene.mesh(object.mesh) else {
            continue;
        };
        let active = scene
            .active_object()
            .is_some_and(|active| std::ptr::eq(active, object));
        println!(
            "{}{}: {}",
            object.name,
            if active { " (active)" } else { "" },
            describe_mesh(mesh, &config.uv_layer_name)
        );
    }

    ExitCode::SUCCESS
}

fn describe_mesh(mesh: &SceneMesh, uv_layer: &str) -> String {
    let mut parts = vec![
        format!("{} vertices", mesh.vertices.len()),
        format!("{} faces", mesh.faces.len()),
        format!("{} material slots", mesh.material_slots.len()),
    ];
    if mesh.uv_layer(uv_layer).is_some() {
        parts.push(format!("UV layer '{}'", uv_layer));
    }
    parts.join(", ")
}
