//! Unit tests for profile page extraction

use github_city::fetcher::profile::{parse_counter, parse_private_contributions, parse_profile};

use crate::support::date;

pub const PROFILE_PAGE: &str = r#"
<html>
  <body>
    <img class="avatar avatar-user" src="https://avatars.githubusercontent.com/u/1234?s=460&v=4" />
    <div class="p-note user-profile-bio"><div>Rust &amp; "embedded" hacker</div></div>
    <ul>
      <li itemprop="homeLocation"><span class="p-label">
        Granada,   Spain
      </span></li>
    </ul>
    <nav>
      <a href="/nitehack?tab=repositories">Repositories <span class="Counter">1.2k</span></a>
      <a href="/nitehack?tab=stars">Stars <span class="Counter">87</span></a>
      <a href="/nitehack?tab=followers">Followers <span class="Counter">3,456</span></a>
      <a href="/nitehack?tab=following">Following <span class="Counter">12</span></a>
    </nav>
    <div class="border-top">
      <a class="avatar-group-item" href="/osl-ugr"><img /></a>
      <a class="avatar-group-item" href="/rust-lang"><img /></a>
    </div>
    <div class="js-yearly-contributions">
      <h2 class="f4 text-normal mb-2">
        1,024 contributions
        in the last year
      </h2>
    </div>
    <details>
      <a class="dropdown-item" href="/nitehack?tab=overview&amp;from=2024-01-01">2024</a>
      <a class="dropdown-item" href="/search?q=created:2011-01-09">Joined GitHub</a>
    </details>
  </body>
</html>
"#;

#[test]
fn test_parse_full_profile() {
    let user = parse_profile("nitehack", PROFILE_PAGE);

    assert_eq!(user.login, "nitehack");
    assert_eq!(user.contributions, 1024);
    assert_eq!(user.avatar, "https://avatars.githubusercontent.com/u/1234");
    assert_eq!(user.repositories, 1200);
    assert_eq!(user.followers, 3456);
    assert_eq!(user.location, "Granada, Spain");
    assert_eq!(user.joined, Some(date("2011-01-09")));
    assert_eq!(user.bio, "Rust & embedded hacker");
    assert_eq!(user.organizations, 2);
}

#[test]
fn test_missing_fields_default() {
    let user = parse_profile("empty", "<html><body><p>nothing here</p></body></html>");

    assert_eq!(user.login, "empty");
    assert_eq!(user.contributions, 0);
    assert_eq!(user.followers, 0);
    assert_eq!(user.repositories, 0);
    assert_eq!(user.organizations, 0);
    assert_eq!(user.joined, None);
    assert!(user.location.is_empty());
    assert!(user.bio.is_empty());
    assert!(user.avatar.is_empty());
}

#[test]
fn test_private_contributions_summed() {
    let html = r#"
        <div>
          <span class="f4 lh-condensed m-0 text-gray">12 contributions</span>
          <span class="f4 lh-condensed m-0 text-gray">30 contributions in private repositories</span>
          <span class="f4 lh-condensed m-0 text-gray">1,001 contributions</span>
        </div>
    "#;
    assert_eq!(parse_private_contributions(html), 1043);
}

#[test]
fn test_idle_window_counts_zero() {
    let html = r#"
        <div>
          <span class="f4 lh-condensed m-0 text-gray">5 contributions</span>
          <span class="text-gray m-0">nitehack had no activity during this period.</span>
        </div>
    "#;
    assert_eq!(parse_private_contributions(html), 0);
}

#[test]
fn test_counter_abbreviations() {
    assert_eq!(parse_counter("9"), Some(9));
    assert_eq!(parse_counter("2.5k"), Some(2500));
    assert_eq!(parse_counter("10k"), Some(10000));
    assert_eq!(parse_counter("-"), None);
    assert_eq!(parse_counter("1.2m"), Some(1_200_000));
    assert_eq!(parse_counter("3M"), Some(3_000_000));
}

#[test]
fn test_counter_overflow_is_rejected() {
    assert_eq!(parse_counter("99999999999999999k"), None);
    assert_eq!(parse_counter("99999999999999m"), None);
    assert_eq!(parse_counter("18446744073709551616"), None);
}
