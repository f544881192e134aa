use std::collections::HashSet;

use tracing::debug;

use crate::domain::{AgentSnapshot, Flow, Page, RouteGroup, ValuePolicy};
use crate::errors::FlattenError;
use crate::flatten::{Flattener, RouteScope};
use crate::resolver::START_PAGE_LABEL;
use crate::rows::{FlowRow, PageRow, RouteGroupRow, RowSets, TransitionRouteRow};

impl<P: ValuePolicy> Flattener<'_, P> {
    /// Emits the Flow row, the synthetic start page, every regular page and
    /// every route group of `flow`, appending into `rows`.
    pub fn flatten_flow(
        &self,
        snapshot: &AgentSnapshot,
        flow: &Flow,
        rows: &mut RowSets,
    ) -> Result<(), FlattenError> {
        let flow_id = flow.name.as_str();
        let pages = snapshot.pages_for(flow_id);

        let walked = distinct_pages(flow_id, pages);

        rows.flows.push(self.flow_row(flow, &walked));
        self.start_page(flow, rows)?;

        for page in walked {
            self.page(flow_id, page, rows)?;
        }

        for group in snapshot.route_groups_for(flow_id) {
            self.route_group(flow_id, group, rows)?;
        }
        Ok(())
    }

    fn flow_row(&self, flow: &Flow, pages: &[&Page]) -> FlowRow {
        let page_ids = std::iter::once(flow.name.clone())
            .chain(pages.iter().map(|page| page.name.clone()))
            .collect();

        FlowRow {
            context: self.context.clone(),
            flow_id: flow.name.clone(),
            flow_name: self.resolver.flow_label(&flow.name),
            pages: page_ids,
        }
    }

    /// The flow object itself stands in for its implicit start page.
    fn start_page(&self, flow: &Flow, rows: &mut RowSets) -> Result<(), FlattenError> {
        let flow_id = flow.name.as_str();
        let scope = RouteScope::page(flow_id, flow_id);
        let routes = self.route_rows(&flow.transition_routes, scope)?;
        let handlers = self.route_rows(&flow.event_handlers, scope)?;
        let route_ids = route_ids(&[&routes, &handlers]);

        rows.pages.push(PageRow {
            context: self.context.clone(),
            flow_id: flow_id.to_string(),
            flow_name: self.resolver.flow_label(flow_id),
            page_id: flow_id.to_string(),
            page_name: START_PAGE_LABEL.to_string(),
            webhook_id: None,
            webhook_name: None,
            webhook_tag: None,
            fulfillment: Vec::new(),
            partial_response: false,
            parameter_presets: Vec::new(),
            parameters: Vec::new(),
            routes: route_ids,
            route_groups: flow.transition_route_groups.clone(),
        });
        rows.transition_routes.extend(routes);
        rows.transition_routes.extend(handlers);
        Ok(())
    }

    fn page(&self, flow_id: &str, page: &Page, rows: &mut RowSets) -> Result<(), FlattenError> {
        let page_id = page.name.as_str();
        let fulfillment = self.fulfillments.flatten(page.entry_fulfillment.as_ref())?;
        let form = self.form_rows(flow_id, page)?;
        let scope = RouteScope::page(flow_id, page_id);
        let routes = self.route_rows(&page.transition_routes, scope)?;
        let handlers = self.route_rows(&page.event_handlers, scope)?;

        let parameter_ids = form.parameters.iter().map(|row| row.parameter_id.clone()).collect();
        let route_ids = route_ids(&[&routes, &handlers, &form.routes]);

        rows.pages.push(PageRow {
            context: self.context.clone(),
            flow_id: flow_id.to_string(),
            flow_name: self.resolver.flow_label(flow_id),
            page_id: page_id.to_string(),
            page_name: page.display_name.clone(),
            webhook_id: fulfillment.webhook_id(),
            webhook_name: fulfillment.webhook_name(),
            webhook_tag: fulfillment.webhook_tag,
            fulfillment: fulfillment.messages,
            partial_response: fulfillment.partial_response,
            parameter_presets: fulfillment.parameter_presets,
            parameters: parameter_ids,
            routes: route_ids,
            route_groups: page.transition_route_groups.clone(),
        });
        rows.parameters.extend(form.parameters);
        rows.transition_routes.extend(routes);
        rows.transition_routes.extend(handlers);
        rows.transition_routes.extend(form.routes);
        Ok(())
    }

    fn route_group(
        &self,
        flow_id: &str,
        group: &RouteGroup,
        rows: &mut RowSets,
    ) -> Result<(), FlattenError> {
        let scope = RouteScope::route_group(flow_id, &group.name);
        let routes = self.route_rows(&group.transition_routes, scope)?;

        rows.route_groups.push(RouteGroupRow {
            context: self.context.clone(),
            flow_id: flow_id.to_string(),
            flow_name: self.resolver.flow_label(flow_id),
            route_group_id: group.name.clone(),
            route_group_name: self.resolver.route_group_label(flow_id, &group.name),
            routes: route_ids(&[&routes]),
        });
        rows.transition_routes.extend(routes);
        Ok(())
    }
}

/// Pages walked for a flow, in snapshot order: built-in markers, repeats and
/// any page sharing the flow's id (the start page) are dropped.
fn distinct_pages<'p>(flow_id: &str, pages: &'p [Page]) -> Vec<&'p Page> {
    let mut seen: HashSet<&str> = HashSet::from([flow_id]);
    let mut walked = Vec::with_capacity(pages.len());

    for page in pages {
        let reason = if Page::is_builtin_marker(&page.name) {
            "built-in page marker"
        } else if !seen.insert(page.name.as_str()) {
            "repeated page id"
        } else {
            walked.push(page);
            continue;
        };
        debug!(
            event_name = "flatten.page_skipped",
            flow_id,
            page_id = %page.name,
            reason,
            "page skipped"
        );
    }
    walked
}

fn route_ids(sets: &[&Vec<TransitionRouteRow>]) -> Vec<String> {
    sets.iter().flat_map(|rows| rows.iter()).map(|row| row.transition_route_id.clone()).collect()
}
