use std::collections::BTreeMap;

use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::error::{DispatchError, RegistryError};
use crate::handlers::{ActionHandler, Tables};
use crate::response::Response;

/// Maps every [`ActionName`] to exactly one handler.
///
/// The registry never falls back on its own: an unknown name is returned to
/// the caller as [`DispatchError::UnknownAction`].
#[derive(Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<ActionName, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard handler for every action, checked for
    /// completeness.
    pub fn standard(tables: Tables) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for handler in tables.into_handlers() {
            registry.register(handler.name(), handler)?;
        }
        registry.ensure_complete()?;
        Ok(registry)
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register(
        &mut self,
        name: ActionName,
        handler: Box<dyn ActionHandler>,
    ) -> Result<&mut Self, RegistryError> {
        if handler.name() != name {
            return Err(RegistryError::Mismatched {
                registered_as: name,
                reported: handler.name(),
            });
        }
        self.handlers.insert(name, handler);
        Ok(self)
    }

    pub fn ensure_complete(&self) -> Result<(), RegistryError> {
        let missing: Vec<ActionName> = ActionName::ALL
            .into_iter()
            .filter(|action| !self.handlers.contains_key(action))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Incomplete(missing))
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = ActionName> + '_ {
        self.handlers.keys().copied()
    }

    pub fn dispatch(
        &self,
        name: &str,
        envelope: &Envelope,
        ctx: &ActionContext,
    ) -> Result<Response, DispatchError> {
        if let Err(err) = envelope.validate() {
            ctx.metrics.record_malformed_envelope();
            tracing::warn!(parent: &ctx.span, error = %err, "rejecting malformed envelope");
            return Err(err);
        }

        let handler = name
            .parse::<ActionName>()
            .ok()
            .and_then(|action| self.handlers.get(&action));
        let Some(handler) = handler else {
            ctx.metrics.record_unknown_action();
            tracing::info!(parent: &ctx.span, action = name, "no handler registered");
            return Err(DispatchError::UnknownAction(name.to_string()));
        };

        ctx.metrics.record_dispatch(handler.name());
        let span = tracing::info_span!(parent: &ctx.span, "dispatch", action = name);
        let _entered = span.enter();
        let response = handler.run(envelope, ctx);
        tracing::debug!(
            mutations = response.mutations.len(),
            payload_keys = response.custom.len(),
            "action completed"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;
    use crate::handlers::{MenuTable, ProcessOrder, SuggestWine, SommelierTable};

    fn ctx() -> ActionContext {
        ActionContext::fixed(at("2024-03-15", "19:00"))
    }

    #[test]
    fn standard_registry_covers_every_action() {
        let registry = ActionRegistry::standard(Tables::standard()).expect("complete registry");
        assert_eq!(registry.actions().collect::<Vec<_>>(), ActionName::ALL.to_vec());
    }

    #[test]
    fn partial_registry_reports_missing_actions() {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionName::ProcessOrder,
                Box::new(ProcessOrder::new(MenuTable::standard())),
            )
            .unwrap();
        match registry.ensure_complete() {
            Err(RegistryError::Incomplete(missing)) => {
                assert_eq!(missing.len(), ActionName::ALL.len() - 1);
                assert!(!missing.contains(&ActionName::ProcessOrder));
            }
            other => panic!("expected incomplete registry, got {other:?}"),
        }
    }

    #[test]
    fn register_rejects_handler_under_wrong_name() {
        let mut registry = ActionRegistry::new();
        let err = registry
            .register(
                ActionName::ProcessOrder,
                Box::new(SuggestWine::new(SommelierTable::standard())),
            )
            .err()
            .expect("mismatch should fail");
        assert_eq!(
            err,
            RegistryError::Mismatched {
                registered_as: ActionName::ProcessOrder,
                reported: ActionName::SuggestWine,
            }
        );
    }

    #[test]
    fn dispatch_routes_by_exact_name() {
        let registry = ActionRegistry::standard(Tables::standard()).unwrap();
        let ctx = ctx();
        let envelope = Envelope::new("action_process_order", "salmon")
            .with_entity("food_item", "salmon");

        let response = registry
            .dispatch("action_process_order", &envelope, &ctx)
            .expect("dispatch succeeds");
        assert!(response.text.contains("1x salmon"));
        assert_eq!(ctx.metrics.snapshot().dispatched["action_process_order"], 1);
    }

    #[test]
    fn unknown_action_is_surfaced_not_handled() {
        let registry = ActionRegistry::standard(Tables::standard()).unwrap();
        let ctx = ctx();
        let envelope = Envelope::new("action_tell_joke", "tell me a joke");

        let err = registry
            .dispatch("action_tell_joke", &envelope, &ctx)
            .expect_err("unknown action");
        assert_eq!(err, DispatchError::UnknownAction("action_tell_joke".to_string()));
        assert_eq!(ctx.metrics.snapshot().unknown_actions, 1);

        let err = registry
            .dispatch("ACTION_PROCESS_ORDER", &envelope, &ctx)
            .expect_err("names are case sensitive");
        assert!(matches!(err, DispatchError::UnknownAction(_)));
    }

    #[test]
    fn malformed_envelope_fails_fast() {
        let registry = ActionRegistry::standard(Tables::standard()).unwrap();
        let ctx = ctx();
        let envelope = Envelope::new("", "hello");
        let err = registry
            .dispatch("action_process_order", &envelope, &ctx)
            .expect_err("blank action name");
        assert!(matches!(err, DispatchError::MalformedEnvelope { .. }));
        assert_eq!(ctx.metrics.snapshot().malformed_envelopes, 1);
    }
}
