//! Known job dispatcher tools.
//!
//! Only names, one-line descriptions and polling defaults live here; each
//! tool's parameter schema is discovered at run time through `parameters`
//! and `parameterdetails`.

use std::time::Duration;

const REST_BASE: &str = "https://www.ebi.ac.uk/Tools/services/rest";
const SOAP_BASE: &str = "https://www.ebi.ac.uk/Tools/services/soap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub poll_interval_secs: u64,
}

impl ToolInfo {
    pub fn rest_url(&self) -> String {
        format!("{}/{}", REST_BASE, self.name)
    }

    pub fn soap_url(&self) -> String {
        format!("{}/{}", SOAP_BASE, self.name)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

const fn tool(name: &'static str, description: &'static str, poll_interval_secs: u64) -> ToolInfo {
    ToolInfo {
        name,
        description,
        poll_interval_secs,
    }
}

pub const TOOLS: &[ToolInfo] = &[
    // Sequence similarity search
    tool("ncbiblast", "NCBI BLAST+ sequence similarity search", 3),
    tool("psiblast", "Position-Specific Iterated BLAST", 3),
    tool("psisearch", "PSI-Search iterative Smith-Waterman search", 3),
    tool("psisearch2", "PSI-Search2 iterative search", 3),
    tool("fasta", "FASTA sequence similarity search", 3),
    tool("fastm", "FASTM: compare peptides to a protein sequence database", 10),
    tool("ssearch", "SSEARCH Smith-Waterman database search", 3),
    tool("ggsearch", "GGSEARCH global alignment database search", 3),
    tool("glsearch", "GLSEARCH global/local alignment database search", 3),
    // Multiple sequence alignment
    tool("clustalo", "Clustal Omega multiple sequence alignment", 3),
    tool("mafft", "MAFFT multiple sequence alignment", 3),
    tool("muscle", "MUSCLE multiple sequence alignment", 3),
    tool("kalign", "Kalign multiple sequence alignment", 3),
    tool("tcoffee", "T-Coffee multiple sequence alignment", 3),
    tool("prank", "PRANK phylogeny-aware alignment", 3),
    tool("mview", "MView alignment visualisation", 3),
    // Pairwise alignment
    tool("emboss_needle", "EMBOSS Needle global alignment", 3),
    tool("emboss_water", "EMBOSS Water local alignment", 3),
    tool("emboss_stretcher", "EMBOSS Stretcher global alignment", 3),
    tool("emboss_matcher", "EMBOSS Matcher local alignment", 3),
    tool("lalign", "LALIGN local alignments", 3),
    tool("genewise", "GeneWise protein to genomic alignment", 3),
    // Sequence operations and analysis
    tool("emboss_seqret", "EMBOSS Seqret format conversion", 3),
    tool("emboss_sixpack", "EMBOSS Sixpack six-frame translation", 3),
    tool("emboss_transeq", "EMBOSS Transeq translation", 3),
    tool("emboss_dottup", "EMBOSS Dottup dot plot", 3),
    tool("emboss_polydot", "EMBOSS Polydot dot plots", 3),
    tool("readseq", "Readseq format conversion", 3),
    tool("seqcksum", "Sequence checksum", 3),
    tool("censor", "CENSOR repeat masking", 3),
    tool("iprscan5", "InterProScan 5 protein function analysis", 3),
    tool("pratt", "Pratt pattern discovery", 3),
    tool("hmmer3_phmmer", "HMMER3 phmmer protein search", 3),
];

/// Registry entry for `name`, if the tool is known.
pub fn lookup(name: &str) -> Option<&'static ToolInfo> {
    TOOLS.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let blast = lookup("NCBIBLAST").unwrap();
        assert_eq!(blast.name, "ncbiblast");
        assert_eq!(blast.rest_url(), "https://www.ebi.ac.uk/Tools/services/rest/ncbiblast");
        assert_eq!(lookup("fastm").unwrap().poll_interval(), Duration::from_secs(10));
        assert!(lookup("not_a_tool").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = TOOLS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOOLS.len());
    }
}
