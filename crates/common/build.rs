//! Build script for generating gRPC code from the tenant proto contract.

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protobuf_src::protoc());

    println!("cargo:rerun-if-changed=../../proto/tenant.proto");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    // The descriptor set feeds the gRPC reflection service in the server.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("tenant_descriptor.bin"))
        .compile(&["../../proto/tenant.proto"], &["../../proto"])?;

    Ok(())
}
