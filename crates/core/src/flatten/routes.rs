use tracing::warn;

use crate::domain::{RouteTarget, TransitionRoute, ValuePolicy};
use crate::errors::FlattenError;
use crate::flatten::Flattener;
use crate::rows::{TargetKind, TransitionRouteRow};

/// Where a list of routes sits in the agent.
///
/// Start-page routes use the flow id as `page_id`; route-group routes have no
/// page; reprompt handlers also carry their form parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteScope<'s> {
    pub flow_id: &'s str,
    pub page_id: Option<&'s str>,
    pub route_group_id: Option<&'s str>,
    pub parameter: Option<ParameterScope<'s>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterScope<'s> {
    pub id: &'s str,
    pub name: &'s str,
}

impl<'s> RouteScope<'s> {
    pub fn page(flow_id: &'s str, page_id: &'s str) -> Self {
        Self { flow_id, page_id: Some(page_id), ..Self::default() }
    }

    pub fn route_group(flow_id: &'s str, route_group_id: &'s str) -> Self {
        Self { flow_id, route_group_id: Some(route_group_id), ..Self::default() }
    }

    pub fn with_parameter(self, id: &'s str, name: &'s str) -> Self {
        Self { parameter: Some(ParameterScope { id, name }), ..self }
    }
}

impl<P: ValuePolicy> Flattener<'_, P> {
    /// One row per route, in input order. An empty list gives an empty set.
    pub fn route_rows(
        &self,
        routes: &[TransitionRoute],
        scope: RouteScope<'_>,
    ) -> Result<Vec<TransitionRouteRow>, FlattenError> {
        routes.iter().map(|route| self.route_row(route, scope)).collect()
    }

    fn route_row(
        &self,
        route: &TransitionRoute,
        scope: RouteScope<'_>,
    ) -> Result<TransitionRouteRow, FlattenError> {
        let resolver = self.resolver;
        let fulfillment = self.fulfillments.flatten(route.trigger_fulfillment.as_ref())?;

        if route.has_conflicting_targets() {
            warn!(
                event_name = "flatten.route_conflicting_targets",
                flow_id = scope.flow_id,
                route_id = %route.name,
                "route names both a target flow and a target page; keeping the flow"
            );
        }
        let (target_kind, target_id, target_name) = match route.target() {
            Some(target) => {
                let kind = match target {
                    RouteTarget::Flow(_) => TargetKind::Flow,
                    RouteTarget::Page(_) => TargetKind::Page,
                };
                (
                    Some(kind),
                    Some(target.id().to_string()),
                    Some(resolver.target_label(scope.flow_id, target)),
                )
            }
            None => (None, None, None),
        };

        Ok(TransitionRouteRow {
            context: self.context.clone(),
            flow_id: scope.flow_id.to_string(),
            flow_name: resolver.flow_label(scope.flow_id),
            page_id: scope.page_id.map(str::to_string),
            page_name: resolver.page_context_label(scope.flow_id, scope.page_id),
            transition_route_id: route.name.clone(),
            route_group_id: scope.route_group_id.map(str::to_string),
            route_group_name: scope
                .route_group_id
                .map(|id| resolver.route_group_label(scope.flow_id, id)),
            intent_id: route.intent.clone(),
            intent_name: route.intent.as_deref().map(|id| resolver.intent_label(id)),
            parameter_id: scope.parameter.map(|parameter| parameter.id.to_string()),
            parameter_name: scope.parameter.map(|parameter| parameter.name.to_string()),
            target_page_id: target_id,
            target_page_name: target_name,
            target_kind,
            webhook_id: fulfillment.webhook_id(),
            webhook_name: fulfillment.webhook_name(),
            webhook_tag: fulfillment.webhook_tag,
            event: route.event.clone(),
            condition: route.condition.clone(),
            fulfillment: fulfillment.messages,
            partial_response: fulfillment.partial_response,
            parameter_presets: fulfillment.parameter_presets,
        })
    }
}
