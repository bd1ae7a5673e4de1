//! File format classification by extension.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Kml,
    Kmz,
    GeoJson,
    Unknown,
}

impl FileType {
    /// Classify a file name, ignoring case and any `?query` suffix.
    ///
    /// Purely name based; contents are never sniffed.
    pub fn detect(filename: &str) -> Self {
        let clean = filename
            .split('?')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if clean.ends_with(".kml") {
            FileType::Kml
        } else if clean.ends_with(".kmz") {
            FileType::Kmz
        } else if clean.ends_with(".geojson") || clean.ends_with(".json") {
            FileType::GeoJson
        } else {
            FileType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Kml => "kml",
            FileType::Kmz => "kmz",
            FileType::GeoJson => "geojson",
            FileType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_extensions() {
        assert_eq!(FileType::detect("bursaova.kml"), FileType::Kml);
        assert_eq!(FileType::detect("BOKA.kmz"), FileType::Kmz);
        assert_eq!(FileType::detect("OVALAR.geojson"), FileType::GeoJson);
        assert_eq!(FileType::detect("data.json"), FileType::GeoJson);
        assert_eq!(FileType::detect("notes.txt"), FileType::Unknown);
        assert_eq!(FileType::detect("kml"), FileType::Unknown);
    }

    #[test]
    fn test_detect_case_insensitive() {
        assert_eq!(FileType::detect("Map.KML"), FileType::Kml);
        assert_eq!(FileType::detect("SU TAHSİS ALANLARI (9).KmZ"), FileType::Kmz);
        assert_eq!(FileType::detect("x.GeoJSON"), FileType::GeoJson);
    }

    #[test]
    fn test_detect_ignores_query_string() {
        assert_eq!(FileType::detect("maps/a.kmz?t=1700000000"), FileType::Kmz);
        assert_eq!(FileType::detect("a.geojson?x=y.kml"), FileType::GeoJson);
        assert_eq!(FileType::detect("a?b.kml"), FileType::Unknown);
    }
}
