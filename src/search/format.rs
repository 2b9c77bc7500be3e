// Plain-text rendering of EBI Search responses

use std::fmt::Write as _;

use crate::search::ebeye::{Domain, Entry, Facet, TopTerm};

const FIELD_OPTIONS: [&str; 8] = [
    "searchable",
    "retrievable",
    "sortable",
    "facet",
    "alias",
    "referenced domain",
    "referenced field",
    "type",
];

/// `id: name`, subdomains indented one tab per level.
pub fn domain_tree(domains: &[Domain]) -> String {
    fn walk(out: &mut String, domain: &Domain, indent: &str) {
        let _ = writeln!(out, "{}{}: {}", indent, domain.id, domain.name.as_deref().unwrap_or(""));
        let deeper = format!("{}\t", indent);
        for sub in &domain.subdomains {
            walk(out, sub, &deeper);
        }
    }

    let mut out = String::new();
    for domain in domains {
        walk(&mut out, domain, "");
    }
    out
}

/// Index information and a field table for every leaf domain.
pub fn domain_details(domains: &[Domain]) -> String {
    fn walk(out: &mut String, domain: &Domain) {
        let _ = writeln!(out, "{} ({})", domain.name.as_deref().unwrap_or(""), domain.id);
        if !domain.subdomains.is_empty() {
            let _ = writeln!(out);
            for sub in &domain.subdomains {
                walk(out, sub);
            }
            return;
        }

        if !domain.index_infos.is_empty() {
            for info in &domain.index_infos {
                let _ = writeln!(out, "{}: {}", info.name, info.value);
            }
            let _ = writeln!(out);
        }
        if !domain.field_infos.is_empty() {
            let _ = writeln!(out, "domain\tfield\t{}", FIELD_OPTIONS.join("\t"));
            for field in &domain.field_infos {
                let mut row = format!("{}\t{}", domain.id, field.id);
                for option in FIELD_OPTIONS {
                    row.push('\t');
                    row.push_str(field.option(option).unwrap_or(""));
                }
                let _ = writeln!(out, "{}", row);
            }
            let _ = writeln!(out);
        }
    }

    let mut out = String::new();
    for domain in domains {
        walk(&mut out, domain);
    }
    out
}

fn entry_values(out: &mut String, entry: &Entry, fields: &[String]) {
    if fields.is_empty() {
        for values in entry.fields.values() {
            for value in values {
                let _ = writeln!(out, "{}", value);
            }
        }
    } else {
        for name in fields {
            for value in entry.fields.get(name).into_iter().flatten() {
                let _ = writeln!(out, "{}", value);
            }
        }
    }
    for url in entry.field_urls.iter().chain(&entry.view_urls) {
        let _ = writeln!(out, "{}", url.value);
    }
}

/// Field values of each entry, one per line, in `fields` order when given.
/// Entries are separated by a blank line.
pub fn entries(entries: &[Entry], fields: &[String]) -> String {
    let mut out = String::new();
    for entry in entries {
        entry_values(&mut out, entry, fields);
        let _ = writeln!(out);
    }
    out
}

pub fn facets(facets: &[Facet]) -> String {
    let mut out = String::new();
    for facet in facets {
        let _ = writeln!(out, "{} ({})", facet.label.as_deref().unwrap_or(""), facet.id);
        for value in &facet.facet_values {
            let _ = writeln!(out, "{} ({}) {}", value.label, value.value, value.count);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn domain_ids(domains: &[Domain]) -> String {
    domains.iter().map(|d| format!("{}\n", d.id)).collect()
}

/// `id referenceCount` followed by the referenced entries' values.
pub fn references(entries: &[Entry], fields: &[String]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "{} {}", entry.id, entry.reference_count.unwrap_or(0));
        for reference in &entry.references {
            entry_values(&mut out, reference, fields);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn top_terms(terms: &[TopTerm]) -> String {
    terms
        .iter()
        .map(|t| format!("{}\t{}\n", t.text, t.doc_freq))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ebeye::{FacetValue, FieldInfo, NameValue};

    fn domain(id: &str, name: &str) -> Domain {
        Domain {
            id: id.to_string(),
            name: Some(name.to_string()),
            ..Domain::default()
        }
    }

    #[test]
    fn test_domain_tree_indents() {
        let mut root = domain("allebi", "All results");
        let mut genomes = domain("genomes", "Genomes");
        genomes.subdomains.push(domain("ensembl", "Ensembl"));
        root.subdomains.push(genomes);

        assert_eq!(
            domain_tree(&[root]),
            "allebi: All results\n\tgenomes: Genomes\n\t\tensembl: Ensembl\n"
        );
    }

    #[test]
    fn test_domain_details_table() {
        let mut uniprot = domain("uniprot", "UniProtKB");
        uniprot.field_infos.push(FieldInfo {
            id: "name".to_string(),
            label: None,
            options: vec![
                NameValue { name: "searchable".into(), value: "true".into() },
                NameValue { name: "type".into(), value: "text".into() },
            ],
        });

        let text = domain_details(&[uniprot]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "UniProtKB (uniprot)");
        assert!(lines[1].starts_with("domain\tfield\tsearchable\tretrievable"));
        assert_eq!(lines[2], "uniprot\tname\ttrue\t\t\t\t\t\t\ttext");
    }

    #[test]
    fn test_entries_follow_requested_field_order() {
        let mut entry = Entry {
            id: "P1".to_string(),
            ..Entry::default()
        };
        entry.fields.insert("acc".into(), vec!["P1".into()]);
        entry.fields.insert("name".into(), vec!["KIN1_HUMAN".into()]);

        let ordered = entries(&[entry.clone()], &["name".to_string(), "acc".to_string()]);
        assert_eq!(ordered, "KIN1_HUMAN\nP1\n\n");
        assert_eq!(entries(&[entry], &[]), "P1\nKIN1_HUMAN\n\n");
    }

    #[test]
    fn test_facets_and_terms() {
        let facet = Facet {
            id: "TAXONOMY".into(),
            label: Some("Organisms".into()),
            total: Some(3),
            facet_values: vec![FacetValue { label: "Human".into(), value: "9606".into(), count: 3 }],
        };
        assert_eq!(facets(&[facet]), "Organisms (TAXONOMY)\nHuman (9606) 3\n\n");
        assert_eq!(
            top_terms(&[TopTerm { text: "kinase".into(), doc_freq: 9 }]),
            "kinase\t9\n"
        );
    }
}
