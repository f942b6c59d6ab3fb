//! The fixed route table served by this deployment.
//!
//! Paths sit directly under the server root, e.g. `http://host:8090/hello_world`.

use webhook_core::{HandlerType, RouteError, RouteRegistry};

use crate::handlers::{
    AddInstrumentTracking, AliquotRatio, AutoCompleteFirstEntry, BarChart, CheckNumberSamples,
    ExperimentRule, HelloWorld, NewGoo, SampleCreation, StepCreation, UserFeedback,
};

/// Every (path, handler type) pair, in registration order.
pub fn route_table() -> Vec<(&'static str, HandlerType)> {
    vec![
        ("/hello_world", HandlerType::stateless::<HelloWorld>()),
        ("/feedback_form", HandlerType::interactive::<UserFeedback>()),
        ("/new_goo", HandlerType::stateless::<NewGoo>()),
        ("/eln/rule_test", HandlerType::stateless::<ExperimentRule>()),
        ("/eln/sample_aliquot_count", HandlerType::stateless::<AliquotRatio>()),
        ("/eln/create_new_steps", HandlerType::stateless::<StepCreation>()),
        ("/eln/sample_creation", HandlerType::stateless::<SampleCreation>()),
        ("/eln/bar_chart_creation", HandlerType::stateless::<BarChart>()),
        (
            "/eln/add_instrument_tracking",
            HandlerType::stateless::<AddInstrumentTracking>(),
        ),
        (
            "/eln/autocomplete_first_entry",
            HandlerType::stateless::<AutoCompleteFirstEntry>(),
        ),
        (
            "/eln/check_number_samples",
            HandlerType::stateless::<CheckNumberSamples>(),
        ),
    ]
}

/// Builds the registry from [`route_table`].
pub fn build_registry() -> Result<RouteRegistry, RouteError> {
    RouteRegistry::from_table(route_table())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use webhook_core::HandlerKind;

    #[test]
    fn table_paths_are_unique() {
        let table = route_table();
        let paths: HashSet<_> = table.iter().map(|(p, _)| *p).collect();
        assert_eq!(paths.len(), table.len());
        assert_eq!(build_registry().unwrap().len(), 11);
    }

    #[test]
    fn only_feedback_is_interactive() {
        let registry = build_registry().unwrap();
        for route in registry.routes() {
            let expected = if route.path == "/feedback_form" {
                HandlerKind::Interactive
            } else {
                HandlerKind::Stateless
            };
            assert_eq!(route.handler.kind(), expected, "{}", route.path);
        }
    }

    #[test]
    fn trailing_slash_is_a_different_path() {
        let registry = build_registry().unwrap();
        assert!(registry.contains("/hello_world"));
        assert!(registry.resolve("/hello_world/").is_err());
    }
}
