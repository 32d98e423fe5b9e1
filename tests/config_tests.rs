//! Configuration loading tests

use std::io::Write;

use harvest::config::{Config, ModelConfig, NotifierConfig, ResponseType, SourceConfig};

const CONFIG: &str = r#"
log_level: debug
limits:
  http_workers: 50
  hosts:
    api.example.com: 4
  browser: 2
  max_depth: 8
items:
  - name: products
    connector:
      url: "https://api.example.com/products"
      response_type: json
      attempts: 2
      server:
        method: GET
        headers:
          Accept: application/json
        timeout: 5s
    model:
      array:
        root_path: "results"
        item:
          fields:
            id: { base: { type: int64, path: "id" } }
            title: { base: { type: string, path: "title" } }
    notifiers:
      - console:
          only_result: true
      - file:
          path: out
          file_name: products.json
  - name: product_report
    connector:
      response_type: json
      reference:
        name: products
    model:
      object:
        fields:
          count:
            base:
              generated:
                calculated:
                  expression: "size(fRes)"
"#;

#[test]
fn full_config_loads_from_yaml() {
    let mut file = tempfile::NamedTempFile::with_suffix(".yaml").expect("temp file");
    file.write_all(CONFIG.as_bytes()).expect("write");

    let config = Config::load(Some(file.path())).expect("loads");

    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.limits.http_workers, Some(50));
    assert_eq!(config.limits.hosts.get("api.example.com"), Some(&4));
    assert_eq!(config.limits.browser, Some(2));
    assert_eq!(config.limits.max_depth, 8);

    assert_eq!(config.items.len(), 2);

    let products = &config.items[0];
    assert_eq!(products.name, "products");
    assert_eq!(products.connector.response_type, ResponseType::Json);
    assert_eq!(products.connector.attempts, 2);
    let SourceConfig::Server(server) = &products.connector.source else {
        panic!("expected server source");
    };
    assert_eq!(server.method, "GET");
    assert_eq!(server.timeout, Some(std::time::Duration::from_secs(5)));
    assert!(matches!(products.model, ModelConfig::Array(_)));
    assert_eq!(products.notifiers.len(), 2);
    assert!(matches!(products.notifiers[0], NotifierConfig::Console(_)));
    assert!(matches!(products.notifiers[1], NotifierConfig::File(_)));

    let report = &config.items[1];
    assert!(matches!(
        report.connector.source,
        SourceConfig::Reference(ref reference) if reference.name == "products"
    ));
}

#[test]
fn duplicate_names_fail_validation() {
    let yaml = r#"
items:
  - name: same
    connector: { static: { value: "{}" } }
    model: { object: { fields: {} } }
  - name: same
    connector: { static: { value: "{}" } }
    model: { object: { fields: {} } }
"#;
    let mut file = tempfile::NamedTempFile::with_suffix(".yaml").expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write");
    assert!(Config::load(Some(file.path())).is_err());
}
