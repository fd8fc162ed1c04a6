use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc unless the environment already points at one.
    if env::var_os("PROTOC").is_none() {
        env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    println!("cargo:rerun-if-changed=proto/input.proto");
    tonic_build::compile_protos("proto/input.proto")?;
    Ok(())
}
