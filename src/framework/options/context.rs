//! Context APIs.

use serde_yaml::Value;

use super::{document, scalar, Check, ContextOpts, InputOptions, Payload};
use crate::error::Result;
use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName, RuntimeVersion};
use crate::library::types::{ContextType, Target};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetContextInputOptions {
    pub runtime_version: RuntimeVersion,
    pub context: ContextOpts,
    pub is_current: bool,
}

impl InputOptions for SetContextInputOptions {
    const API: RuntimeApiName = RuntimeApiName::SetContext;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        self.context.check(&check)
    }

    fn arguments(&self) -> Result<Arguments> {
        let mut args = Arguments::new();
        args.insert(ArgumentKey::Context, document("context", &self.context)?);
        args.insert(ArgumentKey::IsCurrent, Value::Bool(self.is_current));
        Ok(args)
    }
}

mutator_output!(SetContextOutputOptions for SetContext);

string_input!(GetContextInputOptions for GetContext { context_name => ContextName });
payload_output!(GetContextOutputOptions for GetContext { context: ContextOpts });

string_input!(RemoveContextInputOptions for RemoveContext { context_name => ContextName });
mutator_output!(RemoveContextOutputOptions for RemoveContext);

string_input!(DeleteContextInputOptions for DeleteContext { context_name => ContextName });
mutator_output!(DeleteContextOutputOptions for DeleteContext);

string_input!(SetCurrentContextInputOptions for SetCurrentContext { context_name => ContextName });
mutator_output!(SetCurrentContextOutputOptions for SetCurrentContext);

/// Selects the current context by `contextType` on v0.25.4 and by `target`
/// on later versions.
fn current_selector(
    check: &Check,
    target: Option<Target>,
    context_type: Option<ContextType>,
) -> Result<()> {
    if check.version() <= RuntimeVersion::V0254 {
        check.require(context_type.is_some(), "contextType")
    } else {
        check.require(target.is_some(), "target")
    }
}

fn selector_arguments(
    version: RuntimeVersion,
    target: Option<Target>,
    context_type: Option<ContextType>,
) -> Result<Arguments> {
    let mut args = Arguments::new();
    if version <= RuntimeVersion::V0254 {
        if let Some(context_type) = context_type {
            args.insert(ArgumentKey::ContextType, scalar("contextType", &context_type)?);
        }
    } else if let Some(target) = target {
        args.insert(ArgumentKey::Target, scalar("target", &target)?);
    }
    Ok(args)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetCurrentContextInputOptions {
    pub runtime_version: RuntimeVersion,
    pub target: Option<Target>,
    pub context_type: Option<ContextType>,
}

impl InputOptions for GetCurrentContextInputOptions {
    const API: RuntimeApiName = RuntimeApiName::GetCurrentContext;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        current_selector(&check, self.target, self.context_type)
    }

    fn arguments(&self) -> Result<Arguments> {
        selector_arguments(self.runtime_version, self.target, self.context_type)
    }
}

payload_output!(GetCurrentContextOutputOptions for GetCurrentContext { context: ContextOpts });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoveCurrentContextInputOptions {
    pub runtime_version: RuntimeVersion,
    pub target: Option<Target>,
}

impl InputOptions for RemoveCurrentContextInputOptions {
    const API: RuntimeApiName = RuntimeApiName::RemoveCurrentContext;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        current_selector(&check, self.target, None)
    }

    fn arguments(&self) -> Result<Arguments> {
        selector_arguments(self.runtime_version, self.target, None)
    }
}

mutator_output!(RemoveCurrentContextOutputOptions for RemoveCurrentContext);

command_factory!(new_set_context_command(SetContextInputOptions, SetContextOutputOptions));
command_factory!(new_get_context_command(GetContextInputOptions, GetContextOutputOptions));
command_factory!(new_remove_context_command(RemoveContextInputOptions, RemoveContextOutputOptions));
command_factory!(new_delete_context_command(DeleteContextInputOptions, DeleteContextOutputOptions));
command_factory!(new_set_current_context_command(
    SetCurrentContextInputOptions,
    SetCurrentContextOutputOptions
));
command_factory!(
    /// On v0.25.4 set `context_type`; later versions select by `target`.
    new_get_current_context_command(GetCurrentContextInputOptions, GetCurrentContextOutputOptions)
);
command_factory!(new_remove_current_context_command(
    RemoveCurrentContextInputOptions,
    RemoveCurrentContextOutputOptions
));
