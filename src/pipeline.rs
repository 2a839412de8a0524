use std::path::{Path, PathBuf};

use crate::config::{Config, Credentials};
use crate::cover::OEmbedClient;
use crate::error::Result;
use crate::logging::Diagnostics;
use crate::model::PlayRecord;
use crate::readme::{write_side_file, Placement, Readme};
use crate::render::{Fragment, HtmlTable, MarkdownList, RenderMode, Renderer, SvgCard};
use crate::store::{LogQuery, SupabaseStore};

/// Outcome of one run
#[derive(Debug)]
pub struct RunReport {
    pub mode: RenderMode,
    pub records: usize,
    pub readme: PathBuf,
    pub placement: Placement,
    pub side_file: Option<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// fetch -> aggregate -> render -> patch, once
pub struct Pipeline {
    config: Config,
    store: SupabaseStore,
    cover: OEmbedClient,
}

impl Pipeline {
    pub fn new(config: Config, credentials: Credentials) -> Result<Self> {
        let client = crate::http_client(config.timeout)?;
        Ok(Self {
            store: SupabaseStore::new(client.clone(), credentials).with_table(config.table.clone()),
            cover: OEmbedClient::with_endpoint(client, config.oembed_endpoint.clone()),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn query(&self) -> LogQuery {
        LogQuery::last_days(self.config.days).with_limit(self.config.limit)
    }

    pub async fn render(&self, records: &[PlayRecord], diagnostics: &mut Diagnostics) -> Fragment {
        match self.config.mode {
            RenderMode::Markdown => MarkdownList.render(records, diagnostics).await,
            RenderMode::Table => {
                HtmlTable::new(&self.cover, self.config.top)
                    .render(records, diagnostics)
                    .await
            }
            RenderMode::Svg => {
                SvgCard::new(&self.cover, self.config.top, &self.config.svg_path)
                    .render(records, diagnostics)
                    .await
            }
        }
    }

    /// Only failing to read or write the README, or to write the side file, fails the run.
    /// Everything before that degrades into a fragment that says less. The README is read
    /// before the side file is written, so a missing README leaves nothing behind.
    pub async fn run(&self) -> Result<RunReport> {
        let mut diagnostics = Diagnostics::new();

        let records = self.store.fetch(&self.query(), &mut diagnostics).await;
        let fragment = self.render(&records, &mut diagnostics).await;

        let readme = match Readme::read(&self.config.readme) {
            Ok(readme) => readme,
            Err(err) => {
                diagnostics.error("readme", format!("failed to read README: {err}"));
                return Err(err);
            }
        };

        let side_file = match &fragment.side_file {
            Some(side) => {
                let path = readme_dir(&self.config.readme).join(&side.path);
                if let Err(err) = write_side_file(&path, &side.contents) {
                    diagnostics.error("readme", format!("failed to write {}: {err}", path.display()));
                    return Err(err);
                }
                diagnostics.info("readme", format!("wrote {}", path.display()));
                Some(path)
            }
            None => None,
        };

        let placement = match readme.update(&fragment.text, &self.config.anchor) {
            Ok(placement) => placement,
            Err(err) => {
                diagnostics.error("readme", format!("failed to update README: {err}"));
                return Err(err);
            }
        };
        diagnostics.info(
            "readme",
            format!("updated {} ({placement:?})", self.config.readme.display()),
        );

        Ok(RunReport {
            mode: self.config.mode,
            records: records.len(),
            readme: self.config.readme.clone(),
            placement,
            side_file,
            diagnostics,
        })
    }
}

fn readme_dir(readme: &Path) -> &Path {
    match readme.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
