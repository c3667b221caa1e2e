// 💾 Persistence Adapter - hydration, write-through, export/import
//
// Startup resolution (first success wins, failures fall through silently):
//   1. local store under BUILD_KEY, only a non-empty array of rows
//   2. default document (bundled file or HTTP), only a non-empty array
//   3. hardcoded template of common categories
//
// Every mutation writes the full list back under BUILD_KEY.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::build::BuildList;
use crate::error::{BuildError, FormatError, Result};
use crate::row::BuildRow;
use crate::store::{KeyValueStore, BUILD_KEY};

/// File name used for exported builds
pub const EXPORT_FILENAME: &str = "pc-build-config.json";

/// Well-known relative path of the bundled default document
pub const DEFAULT_DOCUMENT_PATH: &str = "./default_build.json";

/// Categories of the fallback template, in order
pub const TEMPLATE_CATEGORIES: [&str; 7] = [
    "Processor",
    "Motherboard",
    "Graphic Card",
    "Memory (RAM)",
    "SSD Drive",
    "Power Supply",
    "Cabinet",
];

// ============================================================================
// ROW ARRAY PARSING
// ============================================================================

/// Parse text into rows.
///
/// The text must be a JSON array whose elements are all objects; fields
/// inside each object are parsed leniently (see [`BuildRow`]).
pub fn parse_rows(contents: &str) -> std::result::Result<Vec<BuildRow>, FormatError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| FormatError::InvalidJson(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(FormatError::NotAnArray),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(FormatError::InvalidRow { index });
            }
            serde_json::from_value(item).map_err(|_| FormatError::InvalidRow { index })
        })
        .collect()
}

// ============================================================================
// DEFAULT DOCUMENT SOURCES
// ============================================================================

/// A place the default build document can be fetched from
pub trait DefaultDocument {
    /// Body of the document; `NetworkUnavailable` when it can't be retrieved
    fn fetch(&self) -> Result<String>;

    fn describe(&self) -> String;
}

/// Document shipped next to the program (a missing file acts as a 404)
#[derive(Debug, Clone)]
pub struct BundledDocument {
    path: PathBuf,
}

impl BundledDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BundledDocument { path: path.into() }
    }
}

impl Default for BundledDocument {
    fn default() -> Self {
        BundledDocument::new(DEFAULT_DOCUMENT_PATH)
    }
}

impl DefaultDocument for BundledDocument {
    fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BuildError::NetworkUnavailable(format!("{} not found", self.path.display()))
            } else {
                BuildError::NetworkUnavailable(format!("{}: {}", self.path.display(), e))
            }
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Default document served over HTTP(S)
#[cfg(feature = "remote")]
pub struct HttpDocument {
    url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpDocument {
    pub fn new(url: &str) -> Self {
        HttpDocument {
            url: url.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "remote")]
impl DefaultDocument for HttpDocument {
    fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| BuildError::NetworkUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuildError::NetworkUnavailable(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        response
            .text()
            .map_err(|e| BuildError::NetworkUnavailable(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Stands in when no usable default document is configured
#[derive(Debug, Clone, Default)]
pub struct NoDefaultDocument;

impl DefaultDocument for NoDefaultDocument {
    fn fetch(&self) -> Result<String> {
        Err(BuildError::NetworkUnavailable(
            "no default document configured".to_string(),
        ))
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// Pick a source for `location`: a URL when it starts with http(s)://,
/// otherwise a file path.
pub fn document_for(location: &str) -> Box<dyn DefaultDocument + Send + Sync> {
    if location.starts_with("http://") || location.starts_with("https://") {
        #[cfg(feature = "remote")]
        {
            return Box::new(HttpDocument::new(location));
        }
        #[cfg(not(feature = "remote"))]
        {
            tracing::warn!(location, "remote default documents need the `remote` feature");
            return Box::new(NoDefaultDocument);
        }
    }

    if location.is_empty() {
        Box::new(NoDefaultDocument)
    } else {
        Box::new(BundledDocument::new(location))
    }
}

// ============================================================================
// HYDRATION
// ============================================================================

/// Which source populated the build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    LocalStore,
    DefaultDocument,
    Template,
}

impl HydrationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HydrationSource::LocalStore => "local store",
            HydrationSource::DefaultDocument => "default document",
            HydrationSource::Template => "template",
        }
    }
}

/// Rows under BUILD_KEY, accepted only when they form a non-empty array
pub fn load_persisted<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<BuildRow>> {
    let raw = store.get(BUILD_KEY)?.ok_or_else(|| {
        BuildError::MalformedPersistedState("nothing stored".to_string())
    })?;

    let rows =
        parse_rows(&raw).map_err(|e| BuildError::MalformedPersistedState(e.to_string()))?;

    if rows.is_empty() {
        return Err(BuildError::MalformedPersistedState(
            "stored build is empty".to_string(),
        ));
    }

    Ok(rows)
}

/// Rows from the default document; an empty array is a valid (empty) result
pub fn load_default_document(document: &dyn DefaultDocument) -> Result<Vec<BuildRow>> {
    let body = document.fetch()?;
    parse_rows(&body).map_err(|e| {
        BuildError::NetworkUnavailable(format!("{} rejected: {}", document.describe(), e))
    })
}

/// The fixed fallback build: one empty row per template category
pub fn template() -> BuildList {
    BuildList::from_rows(
        TEMPLATE_CATEGORIES
            .iter()
            .map(|category| BuildRow::for_category(category))
            .collect(),
    )
}

/// Populate a build from the prioritized sources
pub fn hydrate<S: KeyValueStore + ?Sized>(
    store: &S,
    document: &dyn DefaultDocument,
) -> (BuildList, HydrationSource) {
    match load_persisted(store) {
        Ok(rows) => {
            info!(rows = rows.len(), "hydrated build from local store");
            return (BuildList::from_rows(rows), HydrationSource::LocalStore);
        }
        Err(e) => debug!(error = %e, "local store unusable, trying default document"),
    }

    match load_default_document(document) {
        Ok(rows) if !rows.is_empty() => {
            info!(
                rows = rows.len(),
                source = %document.describe(),
                "hydrated build from default document"
            );
            return (BuildList::from_rows(rows), HydrationSource::DefaultDocument);
        }
        Ok(_) => debug!("default document is empty, using template"),
        Err(e) => debug!(error = %e, "default document unavailable, using template"),
    }

    info!("hydrated build from template");
    (template(), HydrationSource::Template)
}

// ============================================================================
// WRITE PATH
// ============================================================================

/// Write the whole list under BUILD_KEY
pub fn persist<S: KeyValueStore + ?Sized>(list: &BuildList, store: &mut S) -> Result<()> {
    let json = serde_json::to_string(list)?;
    store.set(BUILD_KEY, &json)?;
    debug!(rows = list.len(), "persisted build");
    Ok(())
}

/// Remove the stored build entirely (not the same as storing `[]`)
pub fn clear_persisted<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<()> {
    store.remove(BUILD_KEY)?;
    debug!("removed persisted build");
    Ok(())
}

// ============================================================================
// EXPORT / IMPORT
// ============================================================================

/// Pretty-printed JSON array of rows
pub fn export_to_string(list: &BuildList) -> Result<String> {
    Ok(serde_json::to_string_pretty(list)?)
}

/// Write the export into `dir` under `filename`, returning the full path
pub fn export_to_file(list: &BuildList, dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, export_to_string(list)?)?;
    info!(path = %path.display(), rows = list.len(), "exported build");
    Ok(path)
}

/// Parse an import; fails with a [`FormatError`] for anything but an array of rows
pub fn import_from_str(contents: &str) -> std::result::Result<Vec<BuildRow>, FormatError> {
    parse_rows(contents)
}

pub fn import_from_file(path: &Path) -> Result<Vec<BuildRow>> {
    let contents = fs::read_to_string(path)?;
    Ok(import_from_str(&contents)?)
}

/// Spreadsheet-friendly export: `category,product,price,source`
pub fn export_csv(list: &BuildList, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in list.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = list.len(), "exported build as csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowField;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use tempfile::TempDir;

    /// Default document with fixed contents
    struct StaticDocument(Option<&'static str>);

    impl DefaultDocument for StaticDocument {
        fn fetch(&self) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| BuildError::NetworkUnavailable("404".to_string()))
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    const RYZEN: &str =
        r#"[{"category":"Processor","product":"Ryzen 5","price":"15000","source":"Amazon"}]"#;

    #[test]
    fn test_parse_rows_rejects_non_arrays() {
        assert_eq!(parse_rows(r#"{"not": "an array"}"#), Err(FormatError::NotAnArray));
        assert!(matches!(parse_rows("not json"), Err(FormatError::InvalidJson(_))));
        assert_eq!(
            parse_rows(r#"[{"category":"UPS"}, 7]"#),
            Err(FormatError::InvalidRow { index: 1 })
        );
        assert_eq!(
            parse_rows(r#"[["Processor","x","1","y"]]"#),
            Err(FormatError::InvalidRow { index: 0 })
        );
    }

    #[test]
    fn test_hydrate_prefers_local_store() {
        let store = MemoryStore::with_value(BUILD_KEY, RYZEN);
        let (list, source) = hydrate(&store, &StaticDocument(Some("[]")));

        assert_eq!(source, HydrationSource::LocalStore);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().product, "Ryzen 5");
        assert_eq!(list.total(), 15000.0);
    }

    #[test]
    fn test_hydrate_skips_empty_or_malformed_store() {
        let doc = StaticDocument(Some(r#"[{"category":"Monitor","product":"LG"}]"#));

        for stored in ["[]", "{}", "garbage", r#"[{"category":"x"}, "y"]"#] {
            let store = MemoryStore::with_value(BUILD_KEY, stored);
            let (list, source) = hydrate(&store, &doc);
            assert_eq!(source, HydrationSource::DefaultDocument, "stored {:?}", stored);
            assert_eq!(list.get(0).unwrap().category, "Monitor");
        }
    }

    #[test]
    fn test_hydrate_missing_document_uses_template() {
        let (list, source) = hydrate(&MemoryStore::new(), &StaticDocument(None));

        assert_eq!(source, HydrationSource::Template);
        assert_eq!(list.len(), 7);
        let categories: Vec<_> = list.rows().iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, TEMPLATE_CATEGORIES.to_vec());
        assert!(list.rows().iter().all(|r| r.product.is_empty()
            && r.price.is_empty()
            && r.source.is_empty()));
    }

    #[test]
    fn test_hydrate_empty_document_uses_template() {
        let (list, source) = hydrate(&MemoryStore::new(), &StaticDocument(Some("[]")));

        assert_eq!(source, HydrationSource::Template);
        assert_eq!(list.len(), 7);
    }

    #[test]
    fn test_hydrate_non_array_document_uses_template() {
        let (_, source) = hydrate(&MemoryStore::new(), &StaticDocument(Some(r#"{"a":1}"#)));
        assert_eq!(source, HydrationSource::Template);
    }

    #[test]
    fn test_bundled_document_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let doc = BundledDocument::new(dir.path().join("default_build.json"));

        assert!(matches!(doc.fetch(), Err(BuildError::NetworkUnavailable(_))));
    }

    #[test]
    fn test_bundled_document_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default_build.json");
        fs::write(&path, RYZEN).unwrap();

        let (list, source) = hydrate(&MemoryStore::new(), &BundledDocument::new(&path));
        assert_eq!(source, HydrationSource::DefaultDocument);
        assert_eq!(list.get(0).unwrap().source, "Amazon");
    }

    #[test]
    fn test_document_for_picks_source() {
        assert_eq!(document_for("./default_build.json").describe(), "./default_build.json");
        assert_eq!(document_for("").describe(), "none");
    }

    #[test]
    fn test_persist_and_clear() {
        let mut store = MemoryStore::new();
        let list = template();

        persist(&list, &mut store).unwrap();
        assert_eq!(load_persisted(&store).unwrap(), list.rows().to_vec());

        clear_persisted(&mut store).unwrap();
        assert_eq!(store.get(BUILD_KEY).unwrap(), None);
    }

    #[test]
    fn test_export_is_pretty_printed() {
        let list = BuildList::from_rows(vec![BuildRow::for_category("UPS")]);
        let text = export_to_string(&list).unwrap();

        assert!(text.starts_with("[\n  {\n    \"category\": \"UPS\""));
    }

    #[test]
    fn test_export_file_uses_fixed_name() {
        let dir = TempDir::new().unwrap();
        let path = export_to_file(&template(), dir.path(), EXPORT_FILENAME).unwrap();

        assert_eq!(path.file_name().unwrap(), EXPORT_FILENAME);
        assert_eq!(import_from_file(&path).unwrap(), template().into_rows());
    }

    #[test]
    fn test_import_from_file_reports_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        assert!(matches!(
            import_from_file(&path),
            Err(BuildError::MalformedImportFile(FormatError::NotAnArray))
        ));
    }

    #[test]
    fn test_export_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build.csv");
        let list = BuildList::from_rows(vec![BuildRow::for_category("Processor")
            .with_product("Ryzen 5")
            .with_price("15000")
            .with_source("Amazon")]);

        export_csv(&list, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert_eq!(
            text,
            "category,product,price,source\nProcessor,Ryzen 5,15000,Amazon\n"
        );
    }

    fn arb_row() -> impl Strategy<Value = BuildRow> {
        ("[A-Za-z ()]{0,20}", ".*", ".*", ".*").prop_map(|(category, product, price, source)| {
            let mut row = BuildRow::default()
                .with_product(&product)
                .with_price(&price)
                .with_source(&source);
            row.set_field(RowField::Category, &category);
            row
        })
    }

    proptest! {
        #[test]
        fn prop_import_export_round_trip(rows in proptest::collection::vec(arb_row(), 0..12)) {
            let list = BuildList::from_rows(rows);
            let exported = export_to_string(&list).unwrap();
            let imported = import_from_str(&exported).unwrap();

            prop_assert_eq!(imported, list.into_rows());
        }
    }
}
