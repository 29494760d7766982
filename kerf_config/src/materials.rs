//! Physical material descriptors and the lookup policy over them.
//!
//! Values are pre-normalized reference numbers (density in g/cm³, thermal
//! conductivity in W/mK, melting indicator and 445nm absorptivity already in
//! 0-1). The table ships built in and can be replaced from CSV.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Static physical descriptor for one material key.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MaterialProperties {
    pub density: f32,
    pub thermal: f32,
    pub melt: f32,
    pub absorb: f32,
}

/// Properties assumed for materials the table does not know.
pub const DEFAULT_MATERIAL: MaterialProperties = MaterialProperties {
    density: 0.70,
    thermal: 0.15,
    melt: 0.0,
    absorb: 0.80,
};

/// Manually curated cluster of materials considered interchangeable for
/// transfer purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialGroup {
    Wood,
    Paper,
    Fabric,
    Leather,
}

impl MaterialGroup {
    /// Parse a free-form group label; unknown labels degrade to `None` with
    /// a warning rather than failing the load.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => None,
            "wood" => Some(Self::Wood),
            "paper" => Some(Self::Paper),
            "fabric" => Some(Self::Fabric),
            "leather" => Some(Self::Leather),
            other => {
                tracing::warn!(group = other, "unknown material group, ignoring");
                None
            }
        }
    }
}

/// How a material name was matched against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matched {
    /// Exact key match after lowercase/trim normalization.
    Exact,
    /// Containment match; carries the table key that won.
    Partial(String),
    /// No key matched; `DEFAULT_MATERIAL` is in effect.
    Fallback,
}

/// Result of a table lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub props: MaterialProperties,
    pub group: Option<MaterialGroup>,
    pub matched: Matched,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    props: MaterialProperties,
    group: Option<MaterialGroup>,
}

/// Immutable material reference table, keyed by normalized material name.
///
/// Loaded once at process start and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    entries: BTreeMap<String, Entry>,
}

// (key, density g/cm³, thermal W/mK, melt 0-1, absorb 0-1, similarity group)
// Turkish and English spellings are separate keys on purpose: crowdsourced
// records carry either, and the ASCII-folded variants ("ahsap", "kagit")
// show up from clients without proper input methods.
#[rustfmt::skip]
const BUILTIN: &[(&str, f32, f32, f32, f32, Option<MaterialGroup>)] = &[
    // Wood products
    ("ahşap",              0.60, 0.15, 0.0,  0.85, Some(MaterialGroup::Wood)),
    ("ahsap",              0.60, 0.15, 0.0,  0.85, Some(MaterialGroup::Wood)),
    ("wood",               0.60, 0.15, 0.0,  0.85, Some(MaterialGroup::Wood)),
    ("kontrplak",          0.65, 0.14, 0.0,  0.83, Some(MaterialGroup::Wood)),
    ("plywood",            0.65, 0.14, 0.0,  0.83, Some(MaterialGroup::Wood)),
    ("mdf",                0.75, 0.12, 0.0,  0.80, Some(MaterialGroup::Wood)),
    ("balsa",              0.15, 0.05, 0.0,  0.88, Some(MaterialGroup::Wood)),
    ("bambu",              0.70, 0.16, 0.0,  0.82, Some(MaterialGroup::Wood)),
    ("bamboo",             0.70, 0.16, 0.0,  0.82, Some(MaterialGroup::Wood)),
    ("kayın",              0.72, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("kayin",              0.72, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("beech",              0.72, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("meşe",               0.80, 0.18, 0.0,  0.79, Some(MaterialGroup::Wood)),
    ("mese",               0.80, 0.18, 0.0,  0.79, Some(MaterialGroup::Wood)),
    ("oak",                0.80, 0.18, 0.0,  0.79, Some(MaterialGroup::Wood)),
    ("ceviz",              0.65, 0.16, 0.0,  0.83, Some(MaterialGroup::Wood)),
    ("walnut",             0.65, 0.16, 0.0,  0.83, Some(MaterialGroup::Wood)),
    ("akçaağaç",           0.70, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("akcaagac",           0.70, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("maple",              0.70, 0.17, 0.0,  0.81, Some(MaterialGroup::Wood)),
    ("huş",                0.65, 0.15, 0.0,  0.84, Some(MaterialGroup::Wood)),
    ("hus",                0.65, 0.15, 0.0,  0.84, Some(MaterialGroup::Wood)),
    ("birch",              0.65, 0.15, 0.0,  0.84, Some(MaterialGroup::Wood)),
    ("çam",                0.50, 0.12, 0.0,  0.86, Some(MaterialGroup::Wood)),
    ("cam",                0.50, 0.12, 0.0,  0.86, Some(MaterialGroup::Wood)),
    ("pine",               0.50, 0.12, 0.0,  0.86, Some(MaterialGroup::Wood)),
    ("ladin",              0.45, 0.11, 0.0,  0.87, Some(MaterialGroup::Wood)),
    ("spruce",             0.45, 0.11, 0.0,  0.87, Some(MaterialGroup::Wood)),
    ("fir",                0.45, 0.11, 0.0,  0.87, Some(MaterialGroup::Wood)),
    // Organics
    ("deri",               0.85, 0.16, 0.0,  0.75, Some(MaterialGroup::Leather)),
    ("leather",            0.85, 0.16, 0.0,  0.75, Some(MaterialGroup::Leather)),
    ("karton",             0.45, 0.08, 0.0,  0.90, Some(MaterialGroup::Paper)),
    ("cardboard",          0.45, 0.08, 0.0,  0.90, Some(MaterialGroup::Paper)),
    ("kağıt",              0.30, 0.05, 0.0,  0.92, Some(MaterialGroup::Paper)),
    ("kagit",              0.30, 0.05, 0.0,  0.92, Some(MaterialGroup::Paper)),
    ("paper",              0.30, 0.05, 0.0,  0.92, Some(MaterialGroup::Paper)),
    ("kumaş",              0.40, 0.06, 0.0,  0.88, Some(MaterialGroup::Fabric)),
    ("kumas",              0.40, 0.06, 0.0,  0.88, Some(MaterialGroup::Fabric)),
    ("fabric",             0.40, 0.06, 0.0,  0.88, Some(MaterialGroup::Fabric)),
    ("keçe",               0.35, 0.05, 0.0,  0.89, Some(MaterialGroup::Fabric)),
    ("kece",               0.35, 0.05, 0.0,  0.89, Some(MaterialGroup::Fabric)),
    ("felt",               0.35, 0.05, 0.0,  0.89, Some(MaterialGroup::Fabric)),
    ("mantar",             0.25, 0.04, 0.0,  0.91, None),
    ("cork",               0.25, 0.04, 0.0,  0.91, None),
    // Synthetics
    ("akrilik",            1.18, 0.19, 0.42, 0.65, None),
    ("acrylic",            1.18, 0.19, 0.42, 0.65, None),
    ("plexiglass",         1.18, 0.19, 0.42, 0.65, None),
    ("pleksiglas",         1.18, 0.19, 0.42, 0.65, None),
    ("pmma",               1.18, 0.19, 0.42, 0.65, None),
    ("lastik",             1.10, 0.25, 0.35, 0.70, None),
    ("rubber",             1.10, 0.25, 0.35, 0.70, None),
    ("köpük",              0.20, 0.03, 0.30, 0.93, None),
    ("kopuk",              0.20, 0.03, 0.30, 0.93, None),
    ("foam",               0.20, 0.03, 0.30, 0.93, None),
    // Metal (anodized surface only; bare metal is out of diode range)
    ("anodize_aluminyum",  2.70, 2.05, 0.80, 0.20, None),
    ("anodized_aluminum",  2.70, 2.05, 0.80, 0.20, None),
    // Catch-all
    ("diger",              0.70, 0.15, 0.0,  0.80, None),
    ("other",              0.70, 0.15, 0.0,  0.80, None),
];

impl MaterialTable {
    /// Table shipped with the crate.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(key, density, thermal, melt, absorb, group)| {
                (
                    key.to_string(),
                    Entry {
                        props: MaterialProperties {
                            density,
                            thermal,
                            melt,
                            absorb,
                        },
                        group,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Build a table from explicit entries; later duplicates win.
    pub fn from_entries<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, MaterialProperties, Option<MaterialGroup>)>,
    {
        let entries = iter
            .into_iter()
            .map(|(key, props, group)| {
                (key.trim().to_lowercase(), Entry { props, group })
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a material name.
    ///
    /// Policy, in order:
    /// 1. exact match on the lowercase-trimmed name;
    /// 2. containment match in either direction (`key` inside the query or
    ///    the query inside `key`), **longest key first** with lexicographic
    ///    tie-break, so a short key like "cam" cannot hijack a longer query
    ///    that also mentions "kontrplak";
    /// 3. `DEFAULT_MATERIAL` with no group.
    ///
    /// Never fails: crowdsourced material names are expected to be noisy.
    pub fn resolve(&self, material: &str) -> Resolved {
        let norm = material.trim().to_lowercase();

        if let Some(entry) = self.entries.get(&norm) {
            return Resolved {
                props: entry.props,
                group: entry.group,
                matched: Matched::Exact,
            };
        }

        let mut best: Option<(&str, &Entry)> = None;
        if !norm.is_empty() {
            for (key, entry) in &self.entries {
                if key.contains(&norm) || norm.contains(key.as_str()) {
                    let better = match best {
                        None => true,
                        // BTreeMap iterates keys ascending, so on equal
                        // length the first (lexicographically smaller) key
                        // is kept.
                        Some((cur, _)) => key.len() > cur.len(),
                    };
                    if better {
                        best = Some((key.as_str(), entry));
                    }
                }
            }
        }

        if let Some((key, entry)) = best {
            return Resolved {
                props: entry.props,
                group: entry.group,
                matched: Matched::Partial(key.to_string()),
            };
        }

        Resolved {
            props: DEFAULT_MATERIAL,
            group: None,
            matched: Matched::Fallback,
        }
    }

    /// Similarity group of a material, if any key resolves to one.
    pub fn group_of(&self, material: &str) -> Option<MaterialGroup> {
        self.resolve(material).group
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Material CSV schema.
///
/// Expected headers:
/// material,density,thermal,melt,absorb,group
///
/// Example:
/// material,density,thermal,melt,absorb,group
/// ahşap,0.60,0.15,0.0,0.85,wood
/// akrilik,1.18,0.19,0.42,0.65,
#[derive(Debug, Deserialize)]
struct MaterialRow {
    material: String,
    density: f32,
    thermal: f32,
    melt: f32,
    absorb: f32,
    group: Option<String>,
}

pub fn load_materials_csv(path: &std::path::Path) -> eyre::Result<MaterialTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open materials CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["material", "density", "thermal", "melt", "absorb", "group"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "materials CSV must have headers 'material,density,thermal,melt,absorb,group', got: {}",
            actual.join(",")
        );
    }

    let mut entries = Vec::new();
    for (idx, rec) in rdr.deserialize::<MaterialRow>().enumerate() {
        let row_no = idx + 2; // header is row 1
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", row_no, e),
        };
        let name = row.material.trim().to_lowercase();
        if name.is_empty() {
            eyre::bail!("CSV row {}: empty material name", row_no);
        }
        for (field, value, max) in [
            ("density", row.density, 3.0_f32),
            ("thermal", row.thermal, 2.5),
            ("melt", row.melt, 1.0),
            ("absorb", row.absorb, 1.0),
        ] {
            if !value.is_finite() || !(0.0..=max).contains(&value) {
                eyre::bail!(
                    "CSV row {}: {} = {} out of range [0, {}]",
                    row_no,
                    field,
                    value,
                    max
                );
            }
        }
        let group = row.group.as_deref().and_then(MaterialGroup::parse);
        entries.push((
            name,
            MaterialProperties {
                density: row.density,
                thermal: row.thermal,
                melt: row.melt,
                absorb: row.absorb,
            },
            group,
        ));
    }

    if entries.is_empty() {
        eyre::bail!("materials CSV {:?} contains no rows", path);
    }

    Ok(MaterialTable::from_entries(entries))
}
