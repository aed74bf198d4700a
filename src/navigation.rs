//! The navigation bar shown at the top of every page behind the log-in.

use maud::{Markup, html};

use crate::endpoints;

/// The pages reachable from the navigation bar, in display order.
const LINKS: [(&str, &str); 4] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::EXPENSES_VIEW, "Expenses"),
    (endpoints::INCOME_VIEW, "Income"),
    (endpoints::LOG_OUT, "Log out"),
];

const LINK_STYLE: &str = "block rounded-lg px-3 py-2 text-sm font-medium text-gray-700 \
    hover:bg-gray-100 hover:text-blue-700 dark:text-gray-300 dark:hover:bg-gray-800";

const CURRENT_LINK_STYLE: &str = "block rounded-lg px-3 py-2 text-sm font-semibold \
    bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";

/// The navigation bar, with the link for the page being viewed highlighted.
pub struct NavBar<'a> {
    current_page: &'a str,
}

impl<'a> NavBar<'a> {
    /// `current_page` is the endpoint of the page being viewed. Pages without
    /// a link of their own leave every link unhighlighted.
    pub fn new(current_page: &'a str) -> Self {
        Self { current_page }
    }

    fn is_current(&self, url: &str) -> bool {
        url != endpoints::LOG_OUT && url == self.current_page
    }

    pub fn into_html(self) -> Markup {
        html! {
            nav class="border-b border-gray-200 bg-white dark:border-gray-700 dark:bg-gray-900"
            {
                div
                    class="mx-auto flex max-w-screen-xl flex-wrap items-center justify-between
                    gap-4 p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="" class="h-8";
                        span class="text-2xl font-semibold dark:text-white" { "Expense Tracker" }
                    }

                    ul class="flex flex-wrap gap-2" aria-label="Primary"
                    {
                        @for (url, title) in LINKS {
                            @let is_current = self.is_current(url);
                            li
                            {
                                a
                                    href=(url)
                                    class=(if is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
                                    aria-current=[is_current.then_some("page")]
                                {
                                    (title)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    fn current_links(current_page: &str) -> Vec<String> {
        let html = Html::parse_fragment(&NavBar::new(current_page).into_html().into_string());

        html.select(&Selector::parse("a[aria-current=page]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn highlights_the_current_section() {
        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::EXPENSES_VIEW,
            endpoints::INCOME_VIEW,
        ] {
            assert_eq!(current_links(page), [page]);
        }
    }

    #[test]
    fn other_pages_highlight_nothing() {
        for page in [
            endpoints::ROOT,
            endpoints::NEW_EXPENSE_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::LOG_OUT,
        ] {
            assert!(current_links(page).is_empty(), "{page} highlighted a link");
        }
    }

    #[test]
    fn links_every_section_in_order() {
        let html = Html::parse_fragment(
            &NavBar::new(endpoints::DASHBOARD_VIEW)
                .into_html()
                .into_string(),
        );

        let links: Vec<_> = html
            .select(&Selector::parse("ul a").unwrap())
            .map(|link| link.text().collect::<String>())
            .collect();

        assert_eq!(links, ["Dashboard", "Expenses", "Income", "Log out"]);
    }
}
