//! Compatibility test plugin built against the latest configuration library.

use runtime_compat::framework::types::RuntimeVersion;

fn main() -> anyhow::Result<()> {
    runtime_compat::plugin::main(RuntimeVersion::Latest)
}
