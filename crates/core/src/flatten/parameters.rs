use crate::domain::{Page, ValuePolicy};
use crate::errors::FlattenError;
use crate::flatten::{Flattener, RouteScope};
use crate::rows::{ParameterRow, TransitionRouteRow};

/// Form parameters of one page plus their reprompt-handler routes.
///
/// The routes belong in the TransitionRoutes set, not the Parameters set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterFlattening {
    pub parameters: Vec<ParameterRow>,
    pub routes: Vec<TransitionRouteRow>,
}

/// Form parameters have no id upstream; the page id plus display name stands in.
pub fn parameter_id(page_id: &str, display_name: &str) -> String {
    format!("{page_id}/{display_name}")
}

impl<P: ValuePolicy> Flattener<'_, P> {
    pub fn form_rows(&self, flow_id: &str, page: &Page) -> Result<ParameterFlattening, FlattenError> {
        let resolver = self.resolver;
        let page_id = page.name.as_str();
        let mut flattening = ParameterFlattening::default();

        for parameter in page.form_parameters() {
            let id = parameter_id(page_id, &parameter.display_name);
            let fulfillment = self
                .fulfillments
                .flatten(parameter.fill_behavior.initial_prompt_fulfillment.as_ref())?;
            let scope = RouteScope::page(flow_id, page_id).with_parameter(&id, &parameter.display_name);
            let reprompts = self.route_rows(&parameter.fill_behavior.reprompt_event_handlers, scope)?;
            let route_ids = reprompts.iter().map(|row| row.transition_route_id.clone()).collect();

            flattening.parameters.push(ParameterRow {
                context: self.context.clone(),
                flow_id: flow_id.to_string(),
                flow_name: resolver.flow_label(flow_id),
                page_id: page_id.to_string(),
                page_name: resolver.page_label(flow_id, page_id),
                parameter_id: id.clone(),
                parameter_name: parameter.display_name.clone(),
                entity_id: parameter.entity_type.clone(),
                entity_name: resolver.entity_type_label(&parameter.entity_type),
                webhook_id: fulfillment.webhook_id(),
                webhook_name: fulfillment.webhook_name(),
                webhook_tag: fulfillment.webhook_tag,
                required: parameter.required,
                is_list: parameter.is_list,
                redact_in_log: parameter.redact,
                fulfillment: fulfillment.messages,
                partial_response: fulfillment.partial_response,
                parameter_presets: fulfillment.parameter_presets,
                routes: route_ids,
            });
            flattening.routes.extend(reprompts);
        }

        Ok(flattening)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parameter_id;
    use crate::domain::{DisplayPolicy, Page};
    use crate::flatten::test_support::{context, FLOW};
    use crate::flatten::Flattener;
    use crate::resolver::ReferenceResolver;

    fn page() -> Page {
        serde_json::from_value(json!({
            "name": format!("{FLOW}/pages/p1"),
            "displayName": "Collect Email",
            "form": {"parameters": [
                {
                    "displayName": "email",
                    "entityType": "projects/-/locations/-/agents/-/entityTypes/sys.email",
                    "required": true,
                    "redact": true,
                    "fillBehavior": {
                        "initialPromptFulfillment": {"messages": [{"text": {"text": ["What is your email?"]}}]},
                        "repromptEventHandlers": [
                            {"name": "reprompt-1", "event": "sys.no-match-1"},
                            {"name": "reprompt-2", "event": "sys.no-input-1"}
                        ]
                    }
                },
                {"displayName": "sizes", "entityType": "agents/a/entityTypes/size", "isList": true}
            ]}
        }))
        .expect("page")
    }

    #[test]
    fn one_row_per_parameter_with_composite_id() {
        let mut resolver = ReferenceResolver::default();
        resolver.insert_flow(FLOW, "Default Start Flow");
        resolver.insert_page(FLOW, format!("{FLOW}/pages/p1"), "Collect Email");
        resolver.insert_entity_type("agents/a/entityTypes/size", "size");
        let context = context();
        let flattener = Flattener::new(&context, &resolver, DisplayPolicy);

        let page = page();
        let flattening = flattener.form_rows(FLOW, &page).expect("form");

        assert_eq!(flattening.parameters.len(), 2);
        let email = &flattening.parameters[0];
        assert_eq!(email.parameter_id, parameter_id(&page.name, "email"));
        assert_eq!(email.page_name, "Collect Email");
        assert_eq!(email.entity_name, "sys.email");
        assert!(email.required && email.redact_in_log && !email.is_list);
        assert_eq!(email.fulfillment.len(), 1);
        assert_eq!(email.routes, ["reprompt-1", "reprompt-2"]);

        let sizes = &flattening.parameters[1];
        assert_eq!(sizes.entity_name, "size");
        assert!(sizes.is_list);
        assert!(sizes.routes.is_empty());
    }

    #[test]
    fn reprompt_routes_carry_parameter_context() {
        let resolver = ReferenceResolver::default();
        let context = context();
        let flattener = Flattener::new(&context, &resolver, DisplayPolicy);
        let page = page();
        let flattening = flattener.form_rows(FLOW, &page).expect("form");

        assert_eq!(flattening.routes.len(), 2);
        for route in &flattening.routes {
            assert_eq!(route.parameter_name.as_deref(), Some("email"));
            assert_eq!(route.page_id.as_deref(), Some(page.name.as_str()));
        }
    }

    #[test]
    fn page_without_form_has_no_parameters() {
        let resolver = ReferenceResolver::default();
        let context = context();
        let flattener = Flattener::new(&context, &resolver, DisplayPolicy);
        let page = Page { name: format!("{FLOW}/pages/p2"), ..Page::default() };
        let flattening = flattener.form_rows(FLOW, &page).expect("form");
        assert!(flattening.parameters.is_empty());
        assert!(flattening.routes.is_empty());
    }
}
