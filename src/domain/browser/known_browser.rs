/// A browser package we recognise without asking the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownBrowser {
    pub name: &'static str,
    pub package_names: &'static [&'static str],
}

pub const KNOWN_BROWSERS: &[KnownBrowser] = &[
    KnownBrowser {
        name: "chrome",
        package_names: &[
            "com.android.chrome",
            "com.chrome.beta",
            "com.chrome.dev",
            "com.chrome.canary",
        ],
    },
    KnownBrowser {
        name: "firefox",
        package_names: &[
            "org.mozilla.firefox",
            "org.mozilla.firefox_beta",
            "org.mozilla.fenix",
            "org.mozilla.focus",
            "org.mozilla.fennec_fdroid",
            "io.github.forkmaintainers.iceraven",
            "us.spotco.fennec_dos",
            "org.torproject.torbrowser",
        ],
    },
    KnownBrowser {
        name: "chromium",
        package_names: &[
            "org.chromium.chrome",
            "org.bromite.bromite",
            "org.cromite.cromite",
            "com.kiwibrowser.browser",
            "com.brave.browser",
            "com.vivaldi.browser",
            "com.microsoft.emmx",
            "com.opera.browser",
        ],
    },
    KnownBrowser {
        name: "samsung",
        package_names: &["com.sec.android.app.sbrowser"],
    },
    KnownBrowser {
        name: "duckduckgo",
        package_names: &["com.duckduckgo.mobile.android"],
    },
];

impl KnownBrowser {
    /// Look up a browser by package name (the host of an `android-app` referrer).
    pub fn is_known_browser(package_name: Option<&str>) -> Option<&'static KnownBrowser> {
        let package_name = package_name?;
        KNOWN_BROWSERS
            .iter()
            .find(|browser| browser.package_names.contains(&package_name))
    }
}
