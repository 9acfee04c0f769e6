//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use ssstash_core::StoreConfig;

/// ssstash - save, fetch, list and delete KMS-encrypted secrets in S3
#[derive(Parser, Debug)]
#[command(name = "ssstash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the names of stored secrets
    #[command(visible_alias = "ls")]
    List,

    /// Encrypt and store a secret
    Put(PutArgs),

    /// Print a secret's value
    Get(GetArgs),

    /// Delete a secret
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),
}

/// Where secrets are stored and how to reach AWS
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// S3 bucket holding the secrets
    #[arg(short, long, env = "SSSTASH_S3_BUCKET", global = true)]
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "SSSTASH_S3_PREFIX", default_value = "", global = true)]
    pub prefix: String,

    /// Named AWS credentials profile
    #[arg(long, env = "SSSTASH_AWS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, env = "SSSTASH_AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (e.g., MinIO)
    #[arg(long, env = "SSSTASH_S3_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Custom KMS endpoint
    #[arg(long, env = "SSSTASH_KMS_ENDPOINT", global = true, hide = true)]
    pub kms_endpoint: Option<String>,
}

impl StoreArgs {
    pub fn to_config(&self) -> StoreConfig {
        StoreConfig {
            bucket: self.bucket.clone().unwrap_or_default(),
            prefix: self.prefix.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            kms_endpoint: self.kms_endpoint.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Secret name
    pub name: String,

    /// Secret value: literal text, `@path` to read a file, or `-` for stdin
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    /// KMS key ID, ARN or alias used to wrap the data key
    #[arg(short, long, env = "SSSTASH_KMS_KEY_ARN")]
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Secret name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Secret name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_put() {
        let cli = Cli::try_parse_from([
            "ssstash", "--bucket", "b", "--prefix", "prod", "put", "db-pass", "s3cr3t", "--key",
            "alias/ssstash",
        ])
        .unwrap();

        let Commands::Put(args) = cli.command else {
            panic!("expected put");
        };
        assert_eq!(args.name, "db-pass");
        assert_eq!(args.value, "s3cr3t");
        assert_eq!(args.key.as_deref(), Some("alias/ssstash"));
        assert_eq!(cli.store.bucket.as_deref(), Some("b"));
        assert_eq!(cli.store.prefix, "prod");
    }

    #[test]
    fn test_put_accepts_stdin_sentinel() {
        let cli = Cli::try_parse_from(["ssstash", "put", "db-pass", "-", "-k", "k"]).unwrap();

        let Commands::Put(args) = cli.command else {
            panic!("expected put");
        };
        assert_eq!(args.value, "-");
    }

    #[test]
    fn test_global_store_args_after_subcommand() {
        let cli = Cli::try_parse_from(["ssstash", "get", "db-pass", "--bucket", "b", "-vv"])
            .unwrap();

        assert!(matches!(cli.command, Commands::Get(ref args) if args.name == "db-pass"));
        assert_eq!(cli.store.bucket.as_deref(), Some("b"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::try_parse_from(["ssstash", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::List));

        let cli = Cli::try_parse_from(["ssstash", "rm", "old"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete(ref args) if args.name == "old"));
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(Cli::try_parse_from(["ssstash", "get"]).is_err());
        assert!(Cli::try_parse_from(["ssstash", "put", "only-name"]).is_err());
    }

    #[test]
    fn test_to_config() {
        let args = StoreArgs {
            bucket: Some("b".to_string()),
            prefix: "team/prod".to_string(),
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };

        let config = args.to_config();
        assert_eq!(config.bucket, "b");
        assert_eq!(config.namespace().prefix(), "team/prod/");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_config_without_bucket_fails_validation() {
        let config = StoreArgs::default().to_config();
        assert!(config.validate().is_err());
    }
}
