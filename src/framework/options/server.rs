//! Server APIs. v0.11.6 writes servers through `AddServer`/`PutServer`,
//! later versions through `SetServer`.

use serde_yaml::Value;

use super::{document, Check, InputOptions, Payload, ServerOpts};
use crate::error::Result;
use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName, RuntimeVersion};

macro_rules! server_input {
    ($name:ident for $api:ident) => {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            pub runtime_version: RuntimeVersion,
            pub server: ServerOpts,
            pub set_current: bool,
        }

        impl InputOptions for $name {
            const API: RuntimeApiName = RuntimeApiName::$api;

            fn runtime_version(&self) -> RuntimeVersion {
                self.runtime_version
            }

            fn validate(&self) -> Result<()> {
                let check = Check::input(Self::API, self.runtime_version)?;
                self.server.check(&check)
            }

            fn arguments(&self) -> Result<Arguments> {
                let mut args = Arguments::new();
                args.insert(ArgumentKey::Server, document("server", &self.server)?);
                args.insert(ArgumentKey::SetCurrent, Value::Bool(self.set_current));
                Ok(args)
            }
        }
    };
}

server_input!(SetServerInputOptions for SetServer);
mutator_output!(SetServerOutputOptions for SetServer);

server_input!(AddServerInputOptions for AddServer);
mutator_output!(AddServerOutputOptions for AddServer);

server_input!(PutServerInputOptions for PutServer);
mutator_output!(PutServerOutputOptions for PutServer);

string_input!(GetServerInputOptions for GetServer { server_name => ServerName });
payload_output!(GetServerOutputOptions for GetServer { server: ServerOpts });

string_input!(RemoveServerInputOptions for RemoveServer { server_name => ServerName });
mutator_output!(RemoveServerOutputOptions for RemoveServer);

string_input!(DeleteServerInputOptions for DeleteServer { server_name => ServerName });
mutator_output!(DeleteServerOutputOptions for DeleteServer);

string_input!(SetCurrentServerInputOptions for SetCurrentServer { server_name => ServerName });
mutator_output!(SetCurrentServerOutputOptions for SetCurrentServer);

string_input!(GetCurrentServerInputOptions for GetCurrentServer {});
payload_output!(GetCurrentServerOutputOptions for GetCurrentServer { server: ServerOpts });

string_input!(RemoveCurrentServerInputOptions for RemoveCurrentServer { server_name => ServerName });
mutator_output!(RemoveCurrentServerOutputOptions for RemoveCurrentServer);

command_factory!(new_set_server_command(SetServerInputOptions, SetServerOutputOptions));
command_factory!(new_add_server_command(AddServerInputOptions, AddServerOutputOptions));
command_factory!(new_put_server_command(PutServerInputOptions, PutServerOutputOptions));
command_factory!(new_get_server_command(GetServerInputOptions, GetServerOutputOptions));
command_factory!(new_remove_server_command(RemoveServerInputOptions, RemoveServerOutputOptions));
command_factory!(new_delete_server_command(DeleteServerInputOptions, DeleteServerOutputOptions));
command_factory!(new_set_current_server_command(
    SetCurrentServerInputOptions,
    SetCurrentServerOutputOptions
));
command_factory!(new_get_current_server_command(
    GetCurrentServerInputOptions,
    GetCurrentServerOutputOptions
));
command_factory!(new_remove_current_server_command(
    RemoveCurrentServerInputOptions,
    RemoveCurrentServerOutputOptions
));
