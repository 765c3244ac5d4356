use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

// This generates the `layers::register_defaults` function: every file under `src/layers` that
// defines a top level `register_defaults` gets called with the registry being built. Parsing is
// done with `syn`, so layer sources must stay within what `syn` 1.0 understands.
fn register_defaults_path(sources_dir: &Path, file: &Path) -> Result<String, Error> {
    let relative = file
        .strip_prefix(sources_dir)
        .map_err(|e| Error::new(ErrorKind::Other, format!("{:?}: {}", file, e)))?
        .to_str()
        .ok_or_else(|| Error::new(ErrorKind::Other, format!("{:?}: not UTF-8", file)))?;

    let module = relative
        .replace('\\', "/")
        .replace("/mod.rs", "")
        .replace(".rs", "")
        .replace('/', "::");

    Ok(format!("{}::register_defaults(registry)?;", module))
}

fn main() -> std::io::Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
    let sources_dir = PathBuf::from(manifest_dir).join("src").join("layers");

    println!("cargo:rerun-if-changed={}", sources_dir.display());

    let mut entries = walkdir::WalkDir::new(&sources_dir)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
    entries.retain(|entry| {
        entry.file_type().is_file() && entry.path().extension().map_or(false, |e| e == "rs")
    });

    let mut reg_defaults = Vec::new();
    for entry in entries {
        // `layers/mod.rs` is where the generated function lands.
        if entry.path() == sources_dir.join("mod.rs") {
            continue;
        }
        println!("cargo:rerun-if-changed={}", entry.path().display());

        let content = fs::read_to_string(entry.path())?;
        let ast = syn::parse_file(&content).map_err(|e| {
            Error::new(
                ErrorKind::Other,
                format!("file: {:?}, Error: {:?}", entry.path(), e),
            )
        })?;

        for item in ast.items {
            if let syn::Item::Fn(ref i) = item {
                if i.sig.ident == "register_defaults" {
                    reg_defaults.push(register_defaults_path(&sources_dir, entry.path())?);
                }
            }
        }
    }

    let output_str = format!(
        r#"
/// Register Default protocol handlers.
///
/// Each [`Layer`][`crate::layer::Layer`] in `lancet` will be decoded by a certain field in the
/// lower layer for which this particular layer is a payload. For example, [`dns::DNS`] is a
/// payload for [`udp::UDP`] on port 53. Thus while decoding a particular layer, the next layer
/// to be decoded is determined by a value of certain field in the current layer, looked up in
/// one of the dissector tables of the [`Registry`][`crate::registry::Registry`].
///
/// In this function we just call the `register_defaults` functions for each of the currently
/// supported layers. [`Registry::with_defaults`][`crate::registry::Registry::with_defaults`]
/// is the usual way to get here.
///
/// A layer defined outside the crate registers itself in the same tables to request its
/// dissection.
pub fn register_defaults(
    registry: &mut crate::registry::Registry,
) -> Result<(), crate::errors::Error> {{
    {layers_reg_defaults}

    Ok(())
}}
"#,
        layers_reg_defaults = reg_defaults.join("\n    ")
    );

    let outfile_path = PathBuf::from(
        env::var("OUT_DIR").map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?,
    )
    .join("register_defaults.rs");
    fs::write(&outfile_path, output_str)?;

    // Formatting is only cosmetic.
    let _ = std::process::Command::new("rustfmt")
        .arg(&outfile_path)
        .output();

    Ok(())
}
