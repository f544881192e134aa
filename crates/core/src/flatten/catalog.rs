use crate::domain::{EntityType, ValuePolicy, Webhook};
use crate::flatten::Flattener;
use crate::rows::{EntityRow, WebhookRow};

impl<P: ValuePolicy> Flattener<'_, P> {
    /// Full (entity type, value, synonym) cross product, duplicates included.
    pub fn entity_rows(&self, entity_types: &[EntityType]) -> Vec<EntityRow> {
        entity_types
            .iter()
            .flat_map(|entity_type| {
                entity_type.entities.iter().flat_map(move |entity| {
                    entity.synonyms.iter().map(move |synonym| EntityRow {
                        context: self.context.clone(),
                        entity_type_id: entity_type.name.clone(),
                        entity_type_name: entity_type.display_name.clone(),
                        entity: entity.value.clone(),
                        synonym: synonym.clone(),
                    })
                })
            })
            .collect()
    }

    pub fn webhook_rows(&self, webhooks: &[Webhook]) -> Vec<WebhookRow> {
        webhooks
            .iter()
            .map(|webhook| WebhookRow {
                context: self.context.clone(),
                webhook_id: webhook.name.clone(),
                webhook_name: webhook.display_name.clone(),
                timeout: webhook.timeout.clone(),
                service_directory: webhook.service_directory_name().map(str::to_string),
                url: webhook.url().map(str::to_string),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::{DisplayPolicy, EntityType, Webhook};
    use crate::flatten::test_support::context;
    use crate::flatten::Flattener;
    use crate::resolver::ReferenceResolver;

    #[test]
    fn entity_rows_are_value_synonym_cross_product() {
        let entity_types: Vec<EntityType> = serde_json::from_value(json!([
            {
                "name": "entityTypes/size",
                "displayName": "size",
                "entities": [
                    {"value": "large", "synonyms": ["large", "big", "huge"]},
                    {"value": "small", "synonyms": ["small"]}
                ]
            },
            {"name": "entityTypes/empty", "displayName": "empty", "entities": [{"value": "none"}]}
        ]))
        .expect("entity types");

        let resolver = ReferenceResolver::default();
        let context = context();
        let rows = Flattener::new(&context, &resolver, DisplayPolicy).entity_rows(&entity_types);

        assert_eq!(rows.len(), 4);
        let pairs: Vec<(&str, &str)> =
            rows.iter().map(|row| (row.entity.as_str(), row.synonym.as_str())).collect();
        assert_eq!(pairs, [("large", "large"), ("large", "big"), ("large", "huge"), ("small", "small")]);
        assert!(rows.iter().all(|row| row.entity_type_name == "size"));
    }

    #[test]
    fn webhook_rows_pick_the_endpoint() {
        let webhooks: Vec<Webhook> = serde_json::from_value(json!([
            {"name": "webhooks/w1", "displayName": "orders", "timeout": "5s", "genericWebService": {"uri": "https://hooks.example.com/cx"}},
            {
                "name": "webhooks/w2",
                "displayName": "internal",
                "serviceDirectory": {"service": "namespaces/n/services/s", "genericWebService": {"uri": "https://s.internal"}}
            }
        ]))
        .expect("webhooks");

        let resolver = ReferenceResolver::default();
        let context = context();
        let rows = Flattener::new(&context, &resolver, DisplayPolicy).webhook_rows(&webhooks);

        assert_eq!(rows[0].url.as_deref(), Some("https://hooks.example.com/cx"));
        assert_eq!(rows[0].timeout.as_deref(), Some("5s"));
        assert_eq!(rows[0].service_directory, None);
        assert_eq!(rows[1].service_directory.as_deref(), Some("namespaces/n/services/s"));
        assert_eq!(rows[1].url.as_deref(), Some("https://s.internal"));
    }
}
