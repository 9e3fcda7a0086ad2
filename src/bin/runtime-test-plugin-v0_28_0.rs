//! Compatibility test plugin built against the v0.28.0 configuration library.

use runtime_compat::framework::types::RuntimeVersion;

fn main() -> anyhow::Result<()> {
    runtime_compat::plugin::main(RuntimeVersion::V0280)
}
