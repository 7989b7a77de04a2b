//! Command registry.
//!
//! The [`Registry`] owns every command, slash command and converter. It is
//! populated during startup and then shared read-only with the dispatchers
//! behind an `Arc`.
//!
//! # Duplicate policy
//!
//! Every kind of entry fails fast on duplicates:
//!
//! - command names and aliases share one case-insensitive namespace
//! - slash command names are unique (case-sensitive, as delivered by the platform)
//! - one converter per [`TypeTag`]; `string` is reserved
//! - module names are unique

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::command::{Check, Command, SlashCommand, TypeTag, validate_parameters};
use crate::converter::ArgumentConverter;
use crate::error::{RegistryError, RegistryResult};
use crate::module::{Module, ModuleScope};

/// Read-mostly store of commands and converters.
#[derive(Clone, Default)]
pub struct Registry {
    commands: Vec<Arc<Command>>,
    names: HashMap<String, usize>,
    slash_commands: HashMap<String, Arc<SlashCommand>>,
    converters: HashMap<TypeTag, Arc<ArgumentConverter>>,
    modules: Vec<Arc<dyn Module>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a text command.
    ///
    /// Fails if the name or any alias is already taken by any command,
    /// or if the parameter list is malformed.
    pub fn register_command(&mut self, command: Command) -> RegistryResult<()> {
        validate_parameters(&command.name, &command.params)?;

        let name = command.name.to_lowercase();
        if self.names.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand(command.name));
        }

        let mut keys = vec![name];
        for alias in &command.aliases {
            let key = alias.to_lowercase();
            if self.names.contains_key(&key) || keys.contains(&key) {
                return Err(RegistryError::DuplicateAlias {
                    command: command.name.clone(),
                    alias: alias.clone(),
                });
            }
            keys.push(key);
        }

        debug!(
            command = %command.name,
            aliases = ?command.aliases,
            module = command.module.as_deref(),
            "Registered command"
        );

        let position = self.commands.len();
        self.commands.push(Arc::new(command));
        self.names.extend(keys.into_iter().map(|key| (key, position)));
        Ok(())
    }

    /// Registers a slash command.
    pub fn register_slash_command(&mut self, command: SlashCommand) -> RegistryResult<()> {
        if self.slash_commands.contains_key(&command.name) {
            return Err(RegistryError::DuplicateSlashCommand(command.name));
        }

        debug!(command = %command.name, module = command.module.as_deref(), "Registered slash command");
        self.slash_commands
            .insert(command.name.clone(), Arc::new(command));
        Ok(())
    }

    /// Registers an argument converter.
    pub fn register_converter(&mut self, converter: ArgumentConverter) -> RegistryResult<()> {
        let tag = converter.type_tag().clone();
        if tag == TypeTag::STRING {
            return Err(RegistryError::ReservedTypeTag(tag));
        }
        if self.converters.contains_key(&tag) {
            return Err(RegistryError::DuplicateConverter(tag));
        }

        debug!(type_tag = %tag, module = converter.module(), "Registered converter");
        self.converters.insert(tag, Arc::new(converter));
        Ok(())
    }

    /// Appends a check to the command answering to `command`.
    ///
    /// The check runs after every check the command already has.
    pub fn register_check(&mut self, command: &str, check: Check) -> RegistryResult<()> {
        let Some(entry) = self
            .names
            .get(&command.to_lowercase())
            .copied()
            .and_then(|position| self.commands.get_mut(position))
        else {
            return Err(RegistryError::UnknownCommand(command.to_owned()));
        };

        Arc::make_mut(entry).checks.push(check);
        debug!(command = %entry.name, checks = entry.checks.len(), "Registered check");
        Ok(())
    }

    /// Initialises a module and registers everything it declares.
    ///
    /// Registration is all-or-nothing: if `init` fails, the registry is left
    /// as it was.
    pub fn register_module(&mut self, module: Arc<dyn Module>) -> RegistryResult<()> {
        let name: Arc<str> = Arc::from(module.name());
        if self.modules.iter().any(|m| m.name() == &*name) {
            return Err(RegistryError::DuplicateModule(name.to_string()));
        }

        let mut staged = self.clone();
        {
            let mut scope = ModuleScope::new(&mut staged, Arc::clone(&name));
            Arc::clone(&module).init(&mut scope)?;
        }
        staged.modules.push(module);
        *self = staged;

        debug!(module = %name, "Registered module");
        Ok(())
    }

    /// Resolves a text command by name or alias, ignoring case.
    pub fn lookup(&self, token: &str) -> Option<&Arc<Command>> {
        self.names
            .get(&token.to_lowercase())
            .and_then(|&position| self.commands.get(position))
    }

    /// Resolves a slash command by its exact name.
    pub fn slash_command(&self, name: &str) -> Option<&Arc<SlashCommand>> {
        self.slash_commands.get(name)
    }

    /// Returns the converter for `type_tag`, if one is registered.
    pub fn converter_for(&self, type_tag: &TypeTag) -> Option<&Arc<ArgumentConverter>> {
        self.converters.get(type_tag)
    }

    /// Iterates over text commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter()
    }

    pub fn slash_commands(&self) -> impl Iterator<Item = &Arc<SlashCommand>> {
        self.slash_commands.values()
    }

    pub fn converters(&self) -> impl Iterator<Item = &Arc<ArgumentConverter>> {
        self.converters.values()
    }

    /// Iterates over modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.commands.len())
            .field("slash_commands", &self.slash_commands.len())
            .field("converters", &self.converters.len())
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    use crate::command::Parameter;

    fn noop(name: &str) -> crate::command::CommandBuilder {
        Command::builder(name)
    }

    #[test]
    fn test_lookup_by_name_and_alias_ignores_case() {
        let mut registry = Registry::new();
        registry
            .register_command(noop("ping").alias("p").handler(|_e, _a| async {}))
            .unwrap();

        assert_eq!(registry.lookup("ping").unwrap().name(), "ping");
        assert_eq!(registry.lookup("PING").unwrap().name(), "ping");
        assert_eq!(registry.lookup("P").unwrap().name(), "ping");
        assert!(registry.lookup("pong").is_none());
    }

    #[test]
    fn test_alias_collisions_fail() {
        let mut registry = Registry::new();
        registry
            .register_command(noop("ping").alias("p").handler(|_e, _a| async {}))
            .unwrap();

        let err = registry
            .register_command(noop("play").alias("P").handler(|_e, _a| async {}))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateAlias {
                command: "play".into(),
                alias: "P".into(),
            }
        );

        let err = registry
            .register_command(noop("pause").alias("ping").handler(|_e, _a| async {}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAlias { .. }));

        let err = registry
            .register_command(noop("P").handler(|_e, _a| async {}))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCommand("P".into()));

        // rejected commands leave nothing behind
        assert!(registry.lookup("play").is_none());
        assert_eq!(registry.commands().count(), 1);
    }

    #[test]
    fn test_self_colliding_aliases_fail() {
        let mut registry = Registry::new();
        let err = assert_err!(
            registry.register_command(noop("echo").alias("ECHO").handler(|_e, _a| async {}))
        );
        assert!(matches!(err, RegistryError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_malformed_parameters_are_rejected() {
        let mut registry = Registry::new();
        let err = registry
            .register_command(
                noop("say")
                    .param(Parameter::rest())
                    .param(Parameter::required(TypeTag::STRING))
                    .handler(|_e, _a| async {}),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameters { .. }));
    }

    #[test]
    fn test_converter_policy() {
        let mut registry = Registry::new();
        registry.register_converter(ArgumentConverter::number()).unwrap();

        assert_eq!(
            registry.register_converter(ArgumentConverter::number()),
            Err(RegistryError::DuplicateConverter(TypeTag::NUMBER))
        );
        let string = ArgumentConverter::sync(TypeTag::STRING, |t| Ok::<_, anyhow::Error>(Some(t.to_owned())));
        assert_eq!(
            registry.register_converter(string),
            Err(RegistryError::ReservedTypeTag(TypeTag::STRING))
        );
        assert!(registry.converter_for(&TypeTag::NUMBER).is_some());
        assert!(registry.converter_for(&TypeTag::USER).is_none());
    }

    #[test]
    fn test_register_check_appends_in_order() {
        let mut registry = Registry::new();
        registry
            .register_command(
                noop("ban")
                    .alias("b")
                    .check(Check::sync(|_| true).named("first"))
                    .handler(|_e, _a| async {}),
            )
            .unwrap();
        assert_ok!(registry.register_check("B", Check::sync(|_| true).named("second")));

        let names: Vec<_> = registry
            .lookup("ban")
            .unwrap()
            .checks()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, [Some("first"), Some("second")]);

        assert_eq!(
            registry.register_check("kick", Check::sync(|_| true)),
            Err(RegistryError::UnknownCommand("kick".into()))
        );
    }

    #[test]
    fn test_slash_commands_are_exact() {
        let mut registry = Registry::new();
        let kick = || SlashCommand::builder("kick").handler(|_e, _o| async {});
        registry.register_slash_command(kick()).unwrap();

        assert!(registry.slash_command("kick").is_some());
        assert!(registry.slash_command("Kick").is_none());
        assert_eq!(
            registry.register_slash_command(kick()),
            Err(RegistryError::DuplicateSlashCommand("kick".into()))
        );
    }

    struct Greeter {
        fail: bool,
    }

    impl Module for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn init(self: Arc<Self>, scope: &mut ModuleScope<'_>) -> RegistryResult<()> {
            scope.command(Command::builder("hello").handler(|_e, _a| async {}))?;
            scope.converter(ArgumentConverter::number())?;
            if self.fail {
                scope.check("missing", Check::sync(|_| true))?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_module_registration_tags_entries() {
        let mut registry = Registry::new();
        assert_ok!(registry.register_module(Arc::new(Greeter { fail: false })));

        assert_eq!(registry.lookup("hello").unwrap().module(), Some("greeter"));
        assert_eq!(
            registry.converter_for(&TypeTag::NUMBER).unwrap().module(),
            Some("greeter")
        );
        assert_eq!(
            registry.register_module(Arc::new(Greeter { fail: false })),
            Err(RegistryError::DuplicateModule("greeter".into()))
        );
    }

    #[test]
    fn test_failed_module_leaves_registry_untouched() {
        let mut registry = Registry::new();
        let err = registry
            .register_module(Arc::new(Greeter { fail: true }))
            .unwrap_err();

        assert_eq!(err, RegistryError::UnknownCommand("missing".into()));
        assert!(registry.lookup("hello").is_none());
        assert!(registry.converter_for(&TypeTag::NUMBER).is_none());
        assert_eq!(registry.modules().count(), 0);
    }
}
