// `ebiws search`: EBI Search queries

use clap::{Args, Subcommand};

use crate::config::ClientConfig;
use crate::search::{format, split_list, EbeyeClient, SearchQuery};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// EBI Search endpoint
    #[arg(long = "baseUrl", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub method: SearchMethod,
}

/// Paging and URL switches shared by result listings.
#[derive(Args, Debug, Default, Clone)]
pub struct PageArgs {
    /// Index of the first entry
    #[arg(long)]
    pub start: Option<u32>,
    /// Number of entries to return
    #[arg(long)]
    pub size: Option<u32>,
    /// Include field URLs
    #[arg(long)]
    pub fieldurl: bool,
    /// Include view URLs
    #[arg(long)]
    pub viewurl: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SortArgs {
    /// Field to sort on
    #[arg(long)]
    pub sortfield: Option<String>,
    /// ascending or descending
    #[arg(long)]
    pub order: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SearchMethod {
    /// Print the domain tree
    #[command(name = "getDomainsHierarchy")]
    DomainsHierarchy,
    /// Print a domain's index information and fields
    #[command(name = "getDomainDetails")]
    DomainDetails { domain: String },
    /// Count the entries matching a query
    #[command(name = "getNumberOfResults")]
    NumberOfResults { domain: String, query: String },
    /// Print entries matching a query
    #[command(name = "getResults")]
    Results {
        domain: String,
        query: String,
        fields: String,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Print entries and facets matching a query
    #[command(name = "getFacetedResults")]
    FacetedResults {
        domain: String,
        query: String,
        fields: String,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
        /// Facet values per facet
        #[arg(long)]
        facetcount: Option<u32>,
        /// Comma separated facet fields
        #[arg(long)]
        facetfields: Option<String>,
        /// Selected facets, e.g. TAXONOMY:9606
        #[arg(long)]
        facets: Option<String>,
    },
    /// Print entries by id
    #[command(name = "getEntries")]
    Entries {
        domain: String,
        entries: String,
        fields: String,
        #[arg(long)]
        fieldurl: bool,
        #[arg(long)]
        viewurl: bool,
    },
    /// List domains referenced by a domain
    #[command(name = "getDomainsReferencedInDomain")]
    DomainsReferencedInDomain { domain: String },
    /// List domains referenced by an entry
    #[command(name = "getDomainsReferencedInEntry")]
    DomainsReferencedInEntry { domain: String, entry: String },
    /// Print entries of another domain referenced by entries
    #[command(name = "getReferencedEntries")]
    ReferencedEntries {
        domain: String,
        entries: String,
        referenced_domain: String,
        fields: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Print the most frequent terms of a field
    #[command(name = "getTopTerms")]
    TopTerms {
        domain: String,
        field: String,
        #[arg(long)]
        size: Option<u32>,
    },
}

fn build_query(query: String, fields: &str, page: PageArgs, sort: SortArgs) -> SearchQuery {
    SearchQuery {
        field_url: page.fieldurl,
        view_url: page.viewurl,
        sort_field: sort.sortfield,
        order: sort.order,
        ..SearchQuery::new(query)
            .with_fields(fields)
            .with_page(page.start, page.size)
    }
}

pub async fn run(args: SearchArgs, config: &ClientConfig) -> anyhow::Result<()> {
    let base_url = args.base_url.as_deref().unwrap_or(&config.search_url);
    let client = EbeyeClient::new(base_url, config.http.timeout())?;

    match args.method {
        SearchMethod::DomainsHierarchy => {
            print!("{}", format::domain_tree(&client.domain_hierarchy().await?));
        }
        SearchMethod::DomainDetails { domain } => {
            print!("{}", format::domain_details(&client.domain_details(&domain).await?));
        }
        SearchMethod::NumberOfResults { domain, query } => {
            println!("{}", client.number_of_results(&domain, &query).await?);
        }
        SearchMethod::Results { domain, query, fields, page, sort } => {
            let query = build_query(query, &fields, page, sort);
            let entries = client.results(&domain, &query).await?;
            print!("{}", format::entries(&entries, &query.fields));
        }
        SearchMethod::FacetedResults {
            domain,
            query,
            fields,
            page,
            sort,
            facetcount,
            facetfields,
            facets,
        } => {
            let query = SearchQuery {
                facet_count: facetcount,
                facet_fields: facetfields.as_deref().map(split_list).unwrap_or_default(),
                facets: facets.as_deref().map(split_list).unwrap_or_default(),
                ..build_query(query, &fields, page, sort)
            };
            let result = client.faceted_results(&domain, &query).await?;
            print!("{}", format::entries(&result.entries, &query.fields));
            println!();
            print!("{}", format::facets(&result.facets));
        }
        SearchMethod::Entries {
            domain,
            entries,
            fields,
            fieldurl,
            viewurl,
        } => {
            let fields = split_list(&fields);
            let found = client
                .entries(&domain, &entries, &fields, fieldurl, viewurl)
                .await?;
            print!("{}", format::entries(&found, &fields));
        }
        SearchMethod::DomainsReferencedInDomain { domain } => {
            print!(
                "{}",
                format::domain_ids(&client.domains_referenced_in_domain(&domain).await?)
            );
        }
        SearchMethod::DomainsReferencedInEntry { domain, entry } => {
            print!(
                "{}",
                format::domain_ids(&client.domains_referenced_in_entry(&domain, &entry).await?)
            );
        }
        SearchMethod::ReferencedEntries {
            domain,
            entries,
            referenced_domain,
            fields,
            page,
        } => {
            let query = build_query(String::new(), &fields, page, SortArgs::default());
            let found = client
                .referenced_entries(&domain, &entries, &referenced_domain, &query)
                .await?;
            print!("{}", format::references(&found, &query.fields));
        }
        SearchMethod::TopTerms { domain, field, size } => {
            print!("{}", format::top_terms(&client.top_terms(&domain, &field, size).await?));
        }
    }
    Ok(())
}
