use anyhow::bail;
use clap::Args;
use theseus_core::TheseusConfig;
use theseus_rollout::{CanaryConfig, HeaderSelector, generate_rule};
use theseus_rules::RuleSet;

#[derive(Debug, Default, Args)]
pub struct CanaryArgs {
    /// Value of the pods to route to (.metadata.labels, required)
    #[arg(long)]
    pub tag: String,
    /// Label key of the tag (default: from config, else `version`)
    #[arg(long)]
    pub tag_name: Option<String>,
    /// Percentage of traffic to redirect to tag
    #[arg(long)]
    pub weight: Option<u32>,
    /// Precedence (default: one above the active rule)
    #[arg(long)]
    pub precedence: Option<u32>,
    /// Rule name (default: `destination`-test-`tag`)
    #[arg(long)]
    pub name: Option<String>,
    /// HTTP header to route on
    #[arg(long, requires = "regex", conflicts_with_all = ["cookie", "user_agent"])]
    pub header: Option<String>,
    /// An inclusion regex to apply to the HTTP header
    #[arg(long, requires = "header")]
    pub regex: Option<String>,
    /// Implies `--header cookie --regex [regex]`
    #[arg(long, conflicts_with = "user_agent")]
    pub cookie: Option<String>,
    /// Implies `--header user-agent --regex [regex]`
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl CanaryArgs {
    fn selector(&self) -> anyhow::Result<Option<HeaderSelector>> {
        let selector = match (&self.header, &self.regex, &self.cookie, &self.user_agent) {
            (Some(name), Some(regex), None, None) => Some(HeaderSelector::Header {
                name: name.to_lowercase(),
                regex: regex.clone(),
            }),
            (None, None, Some(regex), None) => Some(HeaderSelector::Cookie(regex.clone())),
            (None, None, None, Some(regex)) => Some(HeaderSelector::UserAgent(regex.clone())),
            (None, None, None, None) => None,
            _ => bail!("use one of --header/--regex, --cookie or --user-agent"),
        };
        Ok(selector)
    }

    pub fn to_config(&self, defaults: &TheseusConfig) -> anyhow::Result<CanaryConfig> {
        Ok(CanaryConfig {
            tag: self.tag.clone(),
            tag_name: self
                .tag_name
                .clone()
                .unwrap_or_else(|| defaults.rollout.tag_name.clone()),
            weight: self.weight,
            precedence: self.precedence.or(defaults.rollout.default_precedence),
            name: self.name.clone(),
            selector: self.selector()?,
        })
    }
}

/// Render the next rule for the rules in `text` as YAML.
pub fn generate(text: &str, args: &CanaryArgs, config: &TheseusConfig) -> anyhow::Result<String> {
    let rules = RuleSet::from_yaml(text)?;
    let canary = args.to_config(config)?;
    let rule = generate_rule(&rules, &canary)?;
    Ok(rule.to_yaml()?)
}
