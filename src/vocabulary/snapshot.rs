//! Reference lists shipped with the crate, used when remote refresh is off or fails.

const IANA_MEDIA_TYPES: &[&str] = &[
    "application/gzip",
    "application/json",
    "application/ld+json",
    "application/msword",
    "application/netcdf",
    "application/octet-stream",
    "application/pdf",
    "application/postscript",
    "application/rdf+xml",
    "application/rtf",
    "application/sql",
    "application/vnd.ms-excel",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/x-hdf5",
    "application/x-netcdf",
    "application/x-tar",
    "application/xml",
    "application/zip",
    "audio/mpeg",
    "audio/wav",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/tiff",
    "text/csv",
    "text/html",
    "text/markdown",
    "text/plain",
    "text/tab-separated-values",
    "text/turtle",
    "text/xml",
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
];

const FAIRSHARING_STANDARDS: &[&str] = &[
    "ABCD",
    "CERIF",
    "DataCite Metadata Schema",
    "datacite",
    "DCAT",
    "dcat",
    "DDI",
    "ddi",
    "Darwin Core",
    "dwc",
    "Dublin Core",
    "dc",
    "oai_dc",
    "dcterms",
    "EML",
    "eml",
    "ISO 19115",
    "iso19115",
    "MARC 21",
    "marc21",
    "METS",
    "mets",
    "MODS",
    "mods",
    "PREMIS",
    "premis",
    "schema.org",
    "schemaorg",
    "rdf",
];

const SPDX_LICENSES: &[&str] = &[
    "0BSD",
    "AFL-3.0",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSL-1.0",
    "CC-BY-1.0",
    "CC-BY-2.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC-BY-NC-4.0",
    "CC-BY-NC-ND-4.0",
    "CC-BY-NC-SA-4.0",
    "CC-BY-ND-4.0",
    "CC-BY-SA-3.0",
    "CC-BY-SA-4.0",
    "CC0-1.0",
    "CECILL-2.1",
    "ECL-2.0",
    "EPL-2.0",
    "EUPL-1.2",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "ISC",
    "LGPL-2.1-only",
    "LGPL-3.0-only",
    "MIT",
    "MPL-2.0",
    "ODbL-1.0",
    "ODC-By-1.0",
    "OFL-1.1",
    "PDDL-1.0",
    "Unlicense",
    "Zlib",
];

/// Items of the bundled reference list called `name`, if one ships with the crate.
pub fn bundled_snapshot(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "iana_media_types" => Some(IANA_MEDIA_TYPES),
        "fairsharing_standards" => Some(FAIRSHARING_STANDARDS),
        "spdx" | "spdx_licenses" => Some(SPDX_LICENSES),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_lists_are_bundled() {
        assert!(bundled_snapshot("spdx").is_some_and(|items| items.contains(&"CC-BY-4.0")));
        assert!(bundled_snapshot("iana_media_types").is_some_and(|items| items.contains(&"text/csv")));
        assert!(bundled_snapshot("fairsharing_standards").is_some());
        assert!(bundled_snapshot("getty_aat").is_none());
    }
}
