use std::env;
use std::fs;
use std::path::Path;

const METADATA_KEYS: [(&str, &str); 4] = [
    ("minimum_runtime_version", "MINIMUM_RUNTIME_VERSION"),
    ("minimum_host_version", "MINIMUM_HOST_VERSION"),
    ("minimum_platform_version", "MINIMUM_PLATFORM_VERSION"),
    ("framework_version", "FRAMEWORK_VERSION"),
];

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let requirements_path = Path::new(&out_dir).join("requirements.rs");

    // Read requirement versions from Cargo.toml metadata
    let cargo_manifest = env::var("CARGO_MANIFEST_DIR").unwrap();
    let cargo_toml_path = Path::new(&cargo_manifest).join("Cargo.toml");
    let cargo_toml_content = fs::read_to_string(&cargo_toml_path)
        .expect("Failed to read Cargo.toml");

    let cargo_toml: toml::Value = cargo_toml_content.parse()
        .expect("Failed to parse Cargo.toml");

    let metadata = cargo_toml
        .get("package")
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("envgate"))
        .expect("Failed to find package.metadata.envgate in Cargo.toml");

    let mut content = String::from(
        "// Auto-generated from Cargo.toml metadata (package.metadata.envgate)\n\
         // These values are controlled in Cargo.toml and committed to source control\n",
    );

    for (key, constant) in METADATA_KEYS {
        let value = metadata
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| panic!("Failed to find package.metadata.envgate.{} in Cargo.toml", key));

        content.push_str(&format!("pub const {}: &str = {:?};\n", constant, value));
    }

    fs::write(&requirements_path, content)
        .expect("Failed to write requirements.rs");

    // Tell cargo to rerun if Cargo.toml changes
    println!("cargo:rerun-if-changed=Cargo.toml");
}
