use tabled::{Table, Tabled, settings::Style};
use termtree::Tree;

use tfcf::Resource;
use tfcf::schema::{Attribute, Schema};
use tfcf::validation::Validator;

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: &'static str,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "ForceNew")]
    force_new: bool,
    #[tabled(rename = "Validator")]
    validator: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
}

fn mode(attribute: &Attribute) -> String {
    let mut modes = Vec::new();
    if attribute.required {
        modes.push("required");
    }
    if attribute.optional {
        modes.push("optional");
    }
    if attribute.computed {
        modes.push("computed");
    }
    modes.join(", ")
}

pub fn render_schema_table(schema: &Schema) -> String {
    let rows: Vec<AttributeRow> = schema
        .attributes
        .iter()
        .map(|(name, attribute)| AttributeRow {
            name: *name,
            kind: attribute.kind.to_string(),
            mode: mode(attribute),
            force_new: attribute.force_new,
            validator: attribute.validator.as_ref().map_or("", Validator::name),
            description: attribute.description,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_resource_tree(resources: &[Box<dyn Resource>]) -> String {
    let mut root = Tree::new("resources".to_string());
    for resource in resources {
        let schema = resource.schema();
        let leaves = schema
            .attributes
            .iter()
            .map(|(name, attribute)| format!("{name} ({}, {})", attribute.kind, mode(attribute)));
        root.push(
            Tree::new(format!(
                "{} (schema v{})",
                resource.type_name(),
                schema.version
            ))
            .with_leaves(leaves),
        );
    }
    root.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfcf::resources::{OriginCaCertificateResource, RecordResource};

    #[test]
    fn test_schema_table_lists_every_attribute() {
        let schema = RecordResource.schema();
        let table = render_schema_table(&schema);
        for name in schema.attributes.keys() {
            assert!(table.contains(name), "missing {name}");
        }
        assert!(table.contains("required"));
        assert!(table.contains("string_in_slice"));
    }

    #[test]
    fn test_resource_tree() {
        let resources: Vec<Box<dyn Resource>> =
            vec![Box::new(RecordResource), Box::new(OriginCaCertificateResource)];
        let tree = render_resource_tree(&resources);
        assert!(tree.starts_with("resources"));
        assert!(tree.contains("cloudflare_record (schema v1)"));
        assert!(tree.contains("cloudflare_origin_ca_certificate (schema v0)"));
        assert!(tree.contains("csr (string, required)"));
    }
}
