use anyhow::Result;
use url::Url;

#[cfg(test)]
use mockall::automock;

/// Hands a URI to whatever the platform uses to open links.
#[cfg_attr(test, automock)]
pub trait UriHandler: Send + Sync {
    fn open_uri(&self, uri: &Url) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUriHandler;

impl UriHandler for SystemUriHandler {
    fn open_uri(&self, uri: &Url) -> Result<()> {
        open::that(uri.as_str())?;
        Ok(())
    }
}
