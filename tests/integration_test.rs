use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::PathBuf;
use swagger_from_routes::{
    manifest::load_manifest,
    route::StaticRouteTable,
    scanner::FileScanner,
    serializer::{serialize_json, serialize_yaml},
    swagger_builder::{swagger, SwaggerBuilder, SwaggerDocument},
};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn build_from(names: &[&str]) -> SwaggerDocument {
    let mut table = StaticRouteTable::new();
    for name in names {
        let manifest = load_manifest(&fixture(name)).expect("Failed to load manifest");
        table.merge(manifest.route_table().expect("Invalid manifest"));
    }
    swagger(&table).expect("Failed to assemble document")
}

fn definition_keys<'a>(doc: &'a SwaggerDocument, prefix: &str) -> Vec<&'a String> {
    doc.definitions
        .keys()
        .filter(|k| k.starts_with(prefix))
        .collect()
}

fn lookup<'a>(doc: &'a SwaggerDocument, reference: &Value) -> &'a Value {
    let key = reference
        .as_str()
        .expect("reference should be a string")
        .trim_start_matches("#/definitions/");
    doc.definitions
        .get(key)
        .unwrap_or_else(|| panic!("dangling reference {}", key))
}

#[test]
fn test_shop_paths() {
    let doc = build_from(&["shop.yaml"]);

    let paths: Vec<_> = doc.paths.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec!["/customers/{customer_id}", "/orders", "/orders/{order_id}"]
    );

    let orders = &doc.paths["/orders"];
    assert_eq!(orders.keys().collect::<Vec<_>>(), vec!["get", "post"]);
    assert!(doc.paths.keys().all(|p| !p.contains("internal")));
}

#[test]
fn test_class_view_operations() {
    let doc = build_from(&["shop.yaml"]);
    let orders = &doc.paths["/orders"];

    let list = &orders["get"];
    assert_eq!(list.summary.as_deref(), Some("List orders."));
    assert_eq!(list.description.as_deref(), Some("<br/>Newest first.<br/>"));
    assert_eq!(list.extra["tags"], json!(["orders"]));
    assert_eq!(list.extra["produces"], json!(["application/json"]));
    assert_eq!(list.extra["security"], json!([]));

    let names: Vec<_> = list
        .parameters
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["page", "per_page", "status", "ids"]);
    assert_eq!(
        list.parameters[2],
        json!({
            "name": "status",
            "type": "string",
            "in": "query",
            "description": "Order status",
            "required": false,
            "enum": ["open", "paid", "shipped"],
        })
    );
    assert_eq!(list.parameters[0]["default"], 1);
    assert_eq!(list.parameters[3]["type"], "string");

    let list_schema = &list.responses["200"]["schema"];
    assert_eq!(list_schema["type"], "array");
    let order = lookup(&doc, &list_schema["items"]["$ref"]);
    assert_eq!(order["properties"]["total"], json!({ "type": "number" }));
    assert_eq!(order["properties"]["created_at"], json!({ "type": "string" }));
    assert_eq!(
        order["properties"]["lines"],
        json!({ "type": "array", "items": { "type": "integer" } })
    );
    assert!(order["properties"].get("summary").is_none());

    let create = &orders["post"];
    assert_eq!(create.extra["security"], json!([{ "Bearer": [] }]));
    let mut statuses: Vec<_> = create.responses.keys().collect();
    statuses.sort();
    assert_eq!(statuses, vec!["201", "400"]);
    assert_eq!(create.parameters[0]["in"], "formData");
    assert_eq!(create.parameters[0]["type"], "integer");
}

#[test]
fn test_function_handler_operations() {
    let doc = build_from(&["shop.yaml"]);
    let detail = &doc.paths["/orders/{order_id}"];

    let get = &detail["get"];
    assert_eq!(get.extra["tags"], json!(["order-detail"]));
    assert_eq!(
        get.parameters,
        vec![json!({
            "name": "order_id",
            "type": "integer",
            "in": "path",
            "required": true,
            "description": "order_id",
        })]
    );
    assert_eq!(
        get.responses["200"]["schema"],
        json!({ "$ref": "#/definitions/shop.orders.order_detail:Order" })
    );

    // the same handler answers DELETE with the same attached response
    assert!(detail["delete"].responses.contains_key("200"));
}

#[test]
fn test_only_restricts_nested_properties() {
    let doc = build_from(&["shop.yaml"]);
    let order = &doc.definitions["shop.orders.order_detail:Order"];

    let customer = lookup(&doc, &order["properties"]["customer"]["$ref"]);
    let mut keys: Vec<_> = customer["properties"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    keys.sort();
    // the nested "id" property is dropped
    assert_eq!(keys, vec!["name"]);
}

#[test]
fn test_self_nesting_terminates() {
    let doc = build_from(&["shop.yaml"]);
    let customer = &doc.definitions["shop.customers.get_customer:Customer"];

    let referrer = lookup(&doc, &customer["properties"]["referrer"]["$ref"]);
    assert!(referrer["properties"].get("referrer").is_none());
    assert!(referrer["properties"].get("home").is_some());

    // Customer, its home, the referrer and the referrer's home
    assert_eq!(
        definition_keys(&doc, "shop.customers.get_customer:").len(),
        4
    );
    assert_eq!(
        doc.paths["/customers/{customer_id}"]["get"].extra["security"],
        json!([{ "Bearer": [] }])
    );
}

#[test]
fn test_every_reference_resolves() {
    fn collect_refs(value: &Value, refs: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, inner) in map {
                    match (key.as_str(), inner) {
                        ("$ref", Value::String(r)) => refs.push(r.clone()),
                        _ => collect_refs(inner, refs),
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| collect_refs(v, refs)),
            _ => {}
        }
    }

    let doc = build_from(&["shop.yaml", "admin.json"]);
    let mut refs = Vec::new();
    collect_refs(&serde_json::to_value(&doc).unwrap(), &mut refs);

    assert!(!refs.is_empty());
    for reference in &refs {
        let key = reference.trim_start_matches("#/definitions/");
        assert!(doc.definitions.contains_key(key), "dangling {}", reference);
    }
    for definition in doc.definitions.values() {
        assert!(definition.get("id").is_none());
        assert!(definition.get("schema").is_none());
    }
}

#[test]
fn test_same_schema_name_across_manifests() {
    let doc = build_from(&["shop.yaml", "admin.json"]);

    let warehouse = &doc.definitions["admin.warehouses.warehouse:Warehouse"];
    let admin_address = lookup(&doc, &warehouse["properties"]["address"]["$ref"]);
    assert!(admin_address["properties"].get("postcode").is_some());

    let customer = &doc.definitions["shop.customers.get_customer:Customer"];
    let shop_address = lookup(&doc, &customer["properties"]["home"]["$ref"]);
    assert!(shop_address["properties"].get("street").is_some());

    let operation = &doc.paths["/warehouses/{code}"]["put"];
    assert_eq!(operation.parameters[0]["type"], "string");
    assert_eq!(operation.responses.len(), 1);
}

#[test]
fn test_scan_and_serialize_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for name in ["shop.yaml", "admin.json"] {
        std::fs::copy(fixture(name), temp_dir.path().join(name)).unwrap();
    }
    std::fs::write(temp_dir.path().join("notes.md"), "# not a manifest").unwrap();

    let scan = FileScanner::new(temp_dir.path().to_path_buf())
        .scan()
        .expect("Failed to scan directory");
    assert_eq!(scan.manifest_files.len(), 2);

    let mut table = StaticRouteTable::new();
    for path in &scan.manifest_files {
        table.merge(load_manifest(path).unwrap().route_table().unwrap());
    }
    let mut builder =
        SwaggerBuilder::new().with_info("Shop API".to_string(), "1.2.0".to_string());
    builder.add_table(&table).unwrap();
    let doc = builder.build();

    let json: Value = serde_json::from_str(&serialize_json(&doc).unwrap()).unwrap();
    assert_eq!(json["swagger"], "2.0");
    assert_eq!(json["info"], json!({ "version": "1.2.0", "title": "Shop API" }));
    assert_eq!(json["paths"].as_object().unwrap().len(), 4);

    let yaml = serialize_yaml(&doc).unwrap();
    assert!(yaml.contains("/warehouses/{code}:"));
    assert!(yaml.contains("$ref:"));
}

#[test]
fn test_assembly_is_repeatable() {
    let manifest = load_manifest(&fixture("shop.yaml")).unwrap();
    let table = manifest.route_table().unwrap();

    let first = swagger(&table).unwrap();
    let second = swagger(&table).unwrap();
    assert_eq!(first, second);
}
