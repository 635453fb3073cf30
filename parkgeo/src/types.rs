//! Types de données pour le crate parkgeo

use geo::{BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Document complet du jeu de données : `{ "dataset": { "features": [...] } }`
///
/// Les clés inconnues sont conservées aux deux niveaux pour que l'API d'administration
/// retrouve son document intact après un enrichissement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dataset: Dataset,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Corps du jeu de données
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<RawFeature>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Une feature source, telle que stockée dans le fichier
///
/// La géométrie reste en JSON brut : elle n'est parsée qu'au moment du calcul,
/// feature par feature, pour qu'une géométrie cassée n'empêche pas le chargement.
/// Les membres absents ou `null` sont réécrits à l'identique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FeatureRepr", into = "FeatureRepr")]
pub struct RawFeature {
    pub kind: Option<String>,

    /// `None` quand le membre `geometry` est absent
    pub geometry: Option<Value>,

    pub properties: Map<String, Value>,

    /// Valeur d'origine de `properties` quand ce n'était pas un objet
    properties_shape: PropertiesShape,

    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum PropertiesShape {
    #[default]
    Object,
    Absent,
    Other(Value),
}

/// Forme sérialisée d'une feature
#[derive(Serialize, Deserialize)]
struct FeatureRepr {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    geometry: Option<Value>,

    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    properties: Option<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<FeatureRepr> for RawFeature {
    fn from(repr: FeatureRepr) -> Self {
        let (properties, properties_shape) = match repr.properties {
            Some(Value::Object(map)) => (map, PropertiesShape::Object),
            Some(other) => (Map::new(), PropertiesShape::Other(other)),
            None => (Map::new(), PropertiesShape::Absent),
        };
        Self {
            kind: repr.kind,
            geometry: repr.geometry,
            properties,
            properties_shape,
            extra: repr.extra,
        }
    }
}

impl From<RawFeature> for FeatureRepr {
    fn from(feature: RawFeature) -> Self {
        // Un sac complété par l'enrichissement l'emporte sur la forme d'origine
        let properties = if feature.properties.is_empty() {
            match feature.properties_shape {
                PropertiesShape::Object => Some(Value::Object(feature.properties)),
                PropertiesShape::Absent => None,
                PropertiesShape::Other(value) => Some(value),
            }
        } else {
            Some(Value::Object(feature.properties))
        };
        Self {
            kind: feature.kind,
            geometry: feature.geometry,
            properties,
            extra: feature.extra,
        }
    }
}

impl RawFeature {
    /// Géométrie brute, `null` si absente
    pub fn geometry_value(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.geometry.as_ref().unwrap_or(&NULL)
    }

    /// Vue typée des propriétés
    pub fn park_properties(&self) -> Result<ParkProperties, serde_json::Error> {
        ParkProperties::from_map(&self.properties)
    }

    /// Libellé lisible pour les logs et le rapport
    pub fn label(&self, index: usize) -> String {
        let text = |key: &str| self.properties.get(key).map(value_to_string);
        match (text("code"), text("name")) {
            (Some(code), Some(name)) if !code.is_empty() => format!("#{index} {code} ({name})"),
            (_, Some(name)) if !name.is_empty() => format!("#{index} {name}"),
            (Some(code), _) if !code.is_empty() => format!("#{index} {code}"),
            _ => format!("#{index}"),
        }
    }
}

/// Propriétés d'une feature de parc
///
/// Champs nommés pour ce que le moteur lit ou écrit, plus un sac d'extension
/// pour toutes les autres clés (`id` de l'API d'administration, descriptions...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkProperties {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Surface en km² (la forme entière/flottante d'origine est conservée)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_km2: Option<Derived<Number>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counties: Option<Derived<Vec<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipalities: Option<Derived<Vec<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub established_year: Option<Derived<i64>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParkProperties {
    /// Clés des champs dérivés, dans l'ordre d'écriture
    pub const DERIVED_KEYS: [&'static str; 4] =
        ["areaKm2", "counties", "municipalities", "establishedYear"];

    /// Lit la vue typée depuis un sac de propriétés
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(map.clone()))
    }

    /// Feature retenue pour l'enrichissement : `source == "park"` et non supprimée
    pub fn is_active_park(&self) -> bool {
        self.source.as_deref() == Some("park") && self.status.as_deref() != Some("deleted")
    }

    /// Surface renseignée : nombre non nul, ou toute autre valeur non vide
    pub fn has_area(&self) -> bool {
        match &self.area_km2 {
            Some(Derived::Typed(area)) => area.as_f64().is_some_and(|v| v != 0.0),
            Some(Derived::Raw(value)) => is_truthy(value),
            None => false,
        }
    }

    /// Une valeur qui n'est pas une liste ne compte pas
    pub fn has_counties(&self) -> bool {
        self.counties.as_ref().is_some_and(Derived::is_non_empty_list)
    }

    pub fn has_municipalities(&self) -> bool {
        self.municipalities.as_ref().is_some_and(Derived::is_non_empty_list)
    }

    pub fn has_established_year(&self) -> bool {
        match &self.established_year {
            Some(Derived::Typed(year)) => *year != 0,
            Some(Derived::Raw(value)) => is_truthy(value),
            None => false,
        }
    }

    /// Recopie les champs dérivés renseignés dans le sac de propriétés
    ///
    /// Une clé déjà présente garde sa position, une nouvelle clé est ajoutée à la fin.
    /// Les autres clés ne sont pas touchées.
    pub fn store_derived(&self, map: &mut Map<String, Value>) {
        if let Some(area) = &self.area_km2 {
            map.insert("areaKm2".to_string(), area.to_value(|n| Value::Number(n.clone())));
        }
        if let Some(counties) = &self.counties {
            map.insert("counties".to_string(), counties.to_value(|c| string_list(c)));
        }
        if let Some(municipalities) = &self.municipalities {
            map.insert("municipalities".to_string(), municipalities.to_value(|m| string_list(m)));
        }
        if let Some(year) = &self.established_year {
            map.insert("establishedYear".to_string(), year.to_value(|y| Value::from(*y)));
        }
    }
}

/// Valeur d'un champ dérivé
///
/// L'API d'administration accepte des propriétés libres : une valeur qui n'a pas
/// le type attendu (`"1999"`, `"Viken"`...) est gardée telle quelle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Derived<T> {
    Typed(T),
    Raw(Value),
}

impl<T> Derived<T> {
    /// Valeur typée, si le champ a le type attendu
    pub fn typed(&self) -> Option<&T> {
        match self {
            Self::Typed(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    fn to_value(&self, typed: impl FnOnce(&T) -> Value) -> Value {
        match self {
            Self::Typed(v) => typed(v),
            Self::Raw(value) => value.clone(),
        }
    }
}

impl Derived<Vec<String>> {
    fn is_non_empty_list(&self) -> bool {
        match self {
            Self::Typed(items) => !items.is_empty(),
            Self::Raw(Value::Array(items)) => !items.is_empty(),
            Self::Raw(_) => false,
        }
    }
}

/// Valeur JSON considérée comme renseignée (ni null, ni 0, ni false, ni vide)
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Une région administrative (fylke ou kommune) en WGS84
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub bbox: Option<Rect<f64>>,
}

impl RegionRecord {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let bbox = geometry.bounding_rect();
        Self {
            name: name.into(),
            geometry,
            bbox,
        }
    }
}

/// Document des indices : `{ "parks": { "<clé>": { name?, code?, hints: [...] } } }`
///
/// L'ordre des entrées du fichier est conservé (la première correspondance par code l'emporte).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintsStore {
    #[serde(default, deserialize_with = "null_as_default")]
    pub parks: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Une entrée d'indices pour un parc
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HintEntry {
    #[serde(default)]
    pub name: Option<Value>,

    /// `Some(Value::Null)` pour un `"code": null` explicite
    #[serde(default, deserialize_with = "keep_null")]
    pub code: Option<Value>,

    #[serde(default)]
    pub hints: Option<Vec<Value>>,
}

impl HintEntry {
    /// Code stocké, converti en texte (`""` si absent)
    ///
    /// Un code `null` explicite ne correspond à aucun parc.
    pub fn code_text(&self) -> Option<String> {
        match &self.code {
            None => Some(String::new()),
            Some(Value::Null) => None,
            Some(code) => Some(value_to_string(code)),
        }
    }

    /// Textes des indices
    pub fn hint_texts(&self) -> Vec<String> {
        self.hints
            .iter()
            .flatten()
            .map(value_to_string)
            .collect()
    }
}

impl HintsStore {
    /// Entrées exploitables, dans l'ordre du document
    ///
    /// Une entrée qui n'a pas la forme attendue est ignorée.
    pub fn entries(&self) -> impl Iterator<Item = (&str, HintEntry)> + '_ {
        self.parks.iter().filter_map(|(key, value)| {
            serde_json::from_value::<HintEntry>(value.clone())
                .ok()
                .map(|entry| (key.as_str(), entry))
        })
    }

    /// Entrée par clé exacte
    pub fn get(&self, key: &str) -> Option<HintEntry> {
        self.parks
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Type d'unité ignorée pendant un run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkipUnit {
    /// Feature du jeu de données (propriétés ou géométrie illisibles)
    Feature,
    /// Parc logique entier (aucune géométrie, union impossible)
    Group,
    /// Région administrative
    Region,
    /// Reprojection d'une région (la géométrie non reprojetée est gardée)
    Reprojection,
}

/// Unité ignorée avec sa raison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub unit: SkipUnit,
    /// Identifiant lisible de l'unité
    pub id: String,
    pub reason: String,
}

impl Skip {
    pub fn new(unit: SkipUnit, id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            unit,
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convertit une valeur JSON scalaire en texte (les chaînes sont prises telles quelles)
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
        Some(_) => None,
    })
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Membre présent, y compris `null` (l'absence est traitée par `default`)
fn keep_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties_keep_unknown_keys() {
        let map = json!({
            "id": 17,
            "code": "VK",
            "name": "Ytre Hvaler",
            "source": "park",
            "description": "Marin nasjonalpark"
        });
        let props = ParkProperties::from_map(map.as_object().unwrap()).unwrap();

        assert_eq!(props.code.as_deref(), Some("VK"));
        assert_eq!(props.extra.get("id"), Some(&json!(17)));
        assert_eq!(props.extra.get("description"), Some(&json!("Marin nasjonalpark")));
    }

    #[test]
    fn test_numeric_code_is_read_as_text() {
        let map = json!({"code": 42, "source": "park"});
        let props = ParkProperties::from_map(map.as_object().unwrap()).unwrap();
        assert_eq!(props.code.as_deref(), Some("42"));
    }

    #[test]
    fn test_falsy_derived_fields() {
        let map = json!({
            "areaKm2": 0,
            "counties": [],
            "municipalities": null,
            "establishedYear": 0
        });
        let props = ParkProperties::from_map(map.as_object().unwrap()).unwrap();

        assert!(!props.has_area());
        assert!(!props.has_counties());
        assert!(!props.has_municipalities());
        assert!(!props.has_established_year());
    }

    #[test]
    fn test_store_derived_preserves_key_positions() {
        let mut map = json!({"areaKm2": 0, "code": "VK", "id": 3})
            .as_object()
            .unwrap()
            .clone();
        let mut props = ParkProperties::from_map(&map).unwrap();
        props.area_km2 = Number::from_f64(12.5).map(Derived::Typed);
        props.counties = Some(Derived::Typed(vec!["Viken".to_string()]));
        props.store_derived(&mut map);

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["areaKm2", "code", "id", "counties"]);
        assert_eq!(map["areaKm2"], json!(12.5));
    }

    #[test]
    fn test_active_park() {
        let park = ParkProperties {
            source: Some("park".into()),
            ..Default::default()
        };
        let deleted = ParkProperties {
            source: Some("park".into()),
            status: Some("deleted".into()),
            ..Default::default()
        };
        let other = ParkProperties {
            source: Some("user".into()),
            ..Default::default()
        };

        assert!(park.is_active_park());
        assert!(!deleted.is_active_park());
        assert!(!other.is_active_park());
    }

    #[test]
    fn test_feature_round_trip_keeps_extra_members() {
        let raw = json!({
            "type": "Feature",
            "id": "abc",
            "geometry": null,
            "properties": {"name": "Jotunheimen"}
        });
        let feature: RawFeature = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(feature.kind.as_deref(), Some("Feature"));
        assert_eq!(serde_json::to_value(&feature).unwrap(), raw);
    }

    #[test]
    fn test_hints_entries_skip_malformed() {
        let store: HintsStore = serde_json::from_value(json!({
            "parks": {
                "broken": "not an object",
                "jotunheimen": {"name": "Jotunheimen", "code": "JH", "hints": ["Opprettet i 1980"]}
            }
        }))
        .unwrap();

        let entries: Vec<_> = store.entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "jotunheimen");
        assert_eq!(entries[0].1.code_text().as_deref(), Some("JH"));
    }

    #[test]
    fn test_feature_label() {
        let feature: RawFeature = serde_json::from_value(json!({
            "properties": {"code": "VK", "name": "Varangerhalvøya"}
        }))
        .unwrap();
        assert_eq!(feature.label(3), "#3 VK (Varangerhalvøya)");
        assert_eq!(RawFeature::default().label(0), "#0");
    }

    #[test]
    fn test_derived_fields_of_unexpected_type_are_kept() {
        let map = json!({
            "source": "park",
            "areaKm2": "12",
            "counties": "Viken",
            "municipalities": ["Hvaler", 3],
            "establishedYear": "1999"
        });
        let props = ParkProperties::from_map(map.as_object().unwrap()).unwrap();

        assert!(props.is_active_park());
        assert!(props.has_area());
        assert!(!props.has_counties());
        assert!(props.has_municipalities());
        assert!(props.has_established_year());
        assert_eq!(props.established_year, Some(Derived::Raw(json!("1999"))));

        let mut out = Map::new();
        props.store_derived(&mut out);
        assert_eq!(Value::Object(out), json!({
            "areaKm2": "12",
            "counties": "Viken",
            "municipalities": ["Hvaler", 3],
            "establishedYear": "1999"
        }));
    }

    #[test]
    fn test_empty_raw_values_count_as_unset() {
        let map = json!({"areaKm2": "", "establishedYear": false, "counties": {}});
        let props = ParkProperties::from_map(map.as_object().unwrap()).unwrap();

        assert!(!props.has_area());
        assert!(!props.has_established_year());
        assert!(!props.has_counties());
    }

    #[test]
    fn test_null_containers_read_as_empty() {
        let doc: DatasetDocument = serde_json::from_value(json!({"dataset": null})).unwrap();
        assert!(doc.dataset.features.is_empty());

        let doc: DatasetDocument =
            serde_json::from_value(json!({"dataset": {"features": null}})).unwrap();
        assert!(doc.dataset.features.is_empty());
    }

    #[test]
    fn test_absent_or_null_members_round_trip() {
        let raw = json!({"type": "Feature", "properties": null, "id": 4});
        let feature: RawFeature = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(feature.geometry, None);
        assert!(feature.properties.is_empty());
        assert_eq!(serde_json::to_value(&feature).unwrap(), raw);

        let bare = json!({"geometry": {"type": "Point", "coordinates": [10.0, 60.0]}});
        let feature: RawFeature = serde_json::from_value(bare.clone()).unwrap();
        assert_eq!(serde_json::to_value(&feature).unwrap(), bare);
    }
}
