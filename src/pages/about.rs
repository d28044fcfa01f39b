//! Profile page. Built entirely from the `[profile]` config section.

use crate::config::Config;
use crate::models::{BulletList, Page, PageReport};

pub fn build(config: &Config) -> PageReport {
    let profile = &config.profile;
    let mut report = PageReport::new(Page::About);

    if !profile.name.is_empty() {
        report.title = format!("About Me: {}", profile.name);
    }
    if !profile.headline.is_empty() {
        report.narrative.push(profile.headline.clone());
    }
    if !profile.summary.is_empty() {
        report.narrative.push(profile.summary.clone());
    }

    let sections = [
        ("Experience", profile.experience.clone()),
        ("Skills", profile.skills.clone()),
        (
            "Links",
            profile
                .links
                .iter()
                .map(|l| format!("[{}]({})", l.label, l.url))
                .collect(),
        ),
    ];
    for (heading, items) in sections {
        if !items.is_empty() {
            report.lists.push(BulletList {
                heading: heading.to_string(),
                items,
            });
        }
    }

    report.lists.push(BulletList {
        heading: "Projects".to_string(),
        items: Page::ALL
            .iter()
            .filter(|p| **p != Page::About)
            .map(|p| format!("[{}](#{})", p.title(), p.anchor()))
            .collect(),
    });

    if report.narrative.is_empty() && report.lists.len() == 1 {
        report
            .notes
            .push("No [profile] section configured.".to_string());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileLink;

    #[test]
    fn test_empty_profile_lists_projects_only() {
        let report = build(&Config::default());

        assert_eq!(report.title, "About Me");
        assert_eq!(report.lists.len(), 1);
        assert_eq!(report.lists[0].items.len(), 3);
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn test_profile_sections() {
        let mut config = Config::default();
        config.profile.name = "Jane Doe".to_string();
        config.profile.summary = "Data analyst.".to_string();
        config.profile.skills = vec!["SQL".to_string(), "Python".to_string()];
        config.profile.links = vec![ProfileLink {
            label: "GitHub".to_string(),
            url: "https://github.com/janedoe".to_string(),
        }];

        let report = build(&config);

        assert_eq!(report.title, "About Me: Jane Doe");
        assert_eq!(report.narrative, vec!["Data analyst."]);
        let headings: Vec<&str> = report.lists.iter().map(|l| l.heading.as_str()).collect();
        assert_eq!(headings, vec!["Skills", "Links", "Projects"]);
        assert_eq!(report.lists[1].items[0], "[GitHub](https://github.com/janedoe)");
        assert!(report.notes.is_empty());
    }
}
