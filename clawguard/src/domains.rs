//! Curated domain lists backing the URL layer.
//!
//! Trust here means "a network fetch from this host, by itself, is not worth
//! interrupting the operator for". Hosts that serve arbitrary user-uploaded
//! content never qualify, even when the parent organization is reputable.

use std::sync::LazyLock;

use regex::Regex;

/// Hosts trusted as the sole destination of a network-class command.
///
/// Matching is suffix-based: `api.github.com` is covered by `github.com`.
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    // Code hosting and package registries
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "npmjs.com",
    "npmjs.org",
    "pypi.org",
    "pythonhosted.org",
    "crates.io",
    "rubygems.org",
    "packagist.org",
    "nuget.org",
    "maven.org",
    "gradle.org",
    // Language and runtime vendors
    "rust-lang.org",
    "rustup.rs",
    "python.org",
    "nodejs.org",
    "golang.org",
    "go.dev",
    "ruby-lang.org",
    "php.net",
    "openjdk.org",
    // OS distributions and system packages
    "debian.org",
    "ubuntu.com",
    "archlinux.org",
    "fedoraproject.org",
    "opensuse.org",
    "alpinelinux.org",
    "kernel.org",
    "gnu.org",
    "apache.org",
    "freebsd.org",
    "brew.sh",
    // Container ecosystems
    "docker.com",
    "docker.io",
    "ghcr.io",
    "quay.io",
    "k8s.io",
    "kubernetes.io",
    // Big vendors with stable, non-user-content API surfaces
    "googleapis.com",
    "google.com",
    "microsoft.com",
    "visualstudio.com",
    "azure.com",
    "mozilla.org",
    "cloudflare.com",
    "jetbrains.com",
    "anthropic.com",
    "openai.com",
    // Reference material
    "stackoverflow.com",
    "stackexchange.com",
    "wikipedia.org",
    "readthedocs.io",
    "mdn.dev",
];

/// Host suffixes that carry arbitrary user-controlled content.
///
/// A host matching any of these is untrusted regardless of the trusted-domain
/// list: anyone can stand up a bucket, a user page, or a deployment there.
pub const RISKY_HOST_SUFFIXES: &[&str] = &[
    // Bucket-style object storage
    "s3.amazonaws.com",
    "storage.googleapis.com",
    "blob.core.windows.net",
    "digitaloceanspaces.com",
    "r2.dev",
    "backblazeb2.com",
    // User pages under major hosts
    "github.io",
    "gitlab.io",
    "bitbucket.io",
    "sourceforge.io",
    // Deployment platforms
    "pages.dev",
    "netlify.app",
    "vercel.app",
    "herokuapp.com",
    "web.app",
    "firebaseapp.com",
    "onrender.com",
    "fly.dev",
    "railway.app",
    "surge.sh",
    "glitch.me",
    "repl.co",
    "workers.dev",
    // Tunnels straight into someone's laptop
    "ngrok.io",
    "ngrok-free.app",
    "trycloudflare.com",
    "loca.lt",
];

/// Hosts in the fixed URL-shortener provider set.
///
/// A shortened URL's destination is unknown at decision time, so these take
/// priority over every other network classification.
pub const URL_SHORTENER_HOSTS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "t.co",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "rebrand.ly",
    "tiny.cc",
    "shorturl.at",
    "cutt.ly",
    "rb.gy",
    "t.ly",
    "v.gd",
    "soo.gd",
];

/// URL shapes that reintroduce user-controlled or executable content under an
/// otherwise trusted host. A match never denies on its own; it only suppresses
/// the trusted-domain short-circuit.
pub static RISKY_URL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        // Raw file content under code hosts serves whatever a user committed.
        ("raw-content", r"(?i)raw\.githubusercontent\.com|gitlab\.[^/]+/.*/-/raw/|/raw/"),
        ("gist-raw", r"(?i)gist\.githubusercontent\.com|gist\.github\.com/[^/]+/[^/]+/raw"),
        ("release-download", r"(?i)/releases/download/|objects\.githubusercontent\.com"),
        ("installer-script", r"(?i)/get[.-][a-z0-9_-]+\.sh(\?|$)|/install\.sh(\?|$)|/setup\.sh(\?|$)"),
    ]
    .into_iter()
    .map(|(name, src)| (name, Regex::new(src).expect("built-in risky URL pattern must compile")))
    .collect()
});

/// True if `host` sits under any user-controllable hosting suffix.
pub fn is_risky_host(host: &str) -> bool {
    let host = host.to_lowercase();
    RISKY_HOST_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
}

/// True if `host` is a known URL-shortener provider.
pub fn is_shortener_host(host: &str) -> bool {
    let host = host.to_lowercase();
    URL_SHORTENER_HOSTS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{s}")))
}

/// Name of the first risky URL pattern matching `url`, if any.
pub fn risky_url_pattern(url: &str) -> Option<&'static str> {
    RISKY_URL_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(url))
        .map(|(name, _)| *name)
}
