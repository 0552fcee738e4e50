#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
	Admin,
	Organiser,
	Attendee,
}

impl Role {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"admin" => Some(Self::Admin),
			"organiser" => Some(Self::Organiser),
			"attendee" => Some(Self::Attendee),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::Organiser => "organiser",
			Self::Attendee => "attendee",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
	Get,
	Head,
	Options,
	Post,
	Put,
	Patch,
	Delete,
}

impl Method {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"GET" => Some(Self::Get),
			"HEAD" => Some(Self::Head),
			"OPTIONS" => Some(Self::Options),
			"POST" => Some(Self::Post),
			"PUT" => Some(Self::Put),
			"PATCH" => Some(Self::Patch),
			"DELETE" => Some(Self::Delete),
			_ => None,
		}
	}

	pub fn is_write(&self) -> bool {
		matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
	}
}

pub const ANY_SIGNED_IN: &[Role] = &[Role::Admin, Role::Organiser, Role::Attendee];
pub const STAFF: &[Role] = &[Role::Admin, Role::Organiser];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Requirement {
	Public,
	RoleGated(&'static [Role]),
}

#[derive(Debug)]
pub struct AccessRule {
	pub method: Method,
	pub pattern: &'static str,
	pub requirement: Requirement,
}

/// Route permission rules checked first to last; the first match wins and
/// unmatched requests fall back to `default_requirement`.
#[derive(Debug)]
pub struct RuleSet {
	pub rules: &'static [AccessRule],
	pub default_requirement: Requirement,
}

const fn rule(method: Method, pattern: &'static str, requirement: Requirement) -> AccessRule {
	AccessRule { method, pattern, requirement }
}

const STANDARD_RULES: &[AccessRule] = &[
	rule(Method::Get, "/", Requirement::Public),
	rule(Method::Get, "/sign-in", Requirement::Public),
	rule(Method::Post, "/sign-in", Requirement::Public),
	rule(Method::Post, "/sign-out", Requirement::Public),
	rule(Method::Get, "/api", Requirement::Public),
	rule(Method::Get, "/api/events", Requirement::Public),
	rule(Method::Get, "/api/events/{id}/**", Requirement::Public),
	rule(Method::Get, "/events", Requirement::Public),
	rule(Method::Get, "/events/{id}", Requirement::Public),
	rule(Method::Get, "/api/venues", Requirement::Public),
	rule(Method::Get, "/api/venues/{id}/**", Requirement::Public),
	rule(Method::Get, "/venues", Requirement::Public),
	rule(Method::Get, "/venues/{id}", Requirement::Public),
	rule(Method::Get, "/index.html", Requirement::RoleGated(ANY_SIGNED_IN)),
	rule(Method::Post, "/events/{id}/share", Requirement::RoleGated(ANY_SIGNED_IN)),
	rule(Method::Get, "/events/**", Requirement::RoleGated(STAFF)),
	rule(Method::Post, "/events/**", Requirement::RoleGated(STAFF)),
	rule(Method::Delete, "/events/**", Requirement::RoleGated(STAFF)),
];

impl RuleSet {
	pub const fn standard() -> Self {
		Self { rules: STANDARD_RULES, default_requirement: Requirement::RoleGated(STAFF) }
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scheme {
	Session,
	ApiHeader,
}

/// API paths authenticate per request via the Authorization header; every
/// other path uses the session cookie.
pub fn select_scheme(path: &str) -> Scheme {
	if path == "/api" || path.starts_with("/api/") { Scheme::ApiHeader } else { Scheme::Session }
}

/// One request as the decision procedure sees it. `roles` is `None` when no
/// principal is attached; `csrf_valid` is meaningless on the header scheme.
#[derive(Debug)]
pub struct Access<'a> {
	pub scheme: Scheme,
	pub method: Option<Method>,
	pub path: &'a str,
	pub roles: Option<&'a [Role]>,
	pub csrf_valid: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessDecision {
	Permit,
	AuthenticationRequired,
	AuthorizationDenied,
}

#[derive(Debug)]
pub struct AccessEvaluation<'a> {
	pub decision: AccessDecision,
	pub requirement: Requirement,
	pub matched_rule: Option<&'a AccessRule>,
}

pub fn evaluate_access<'a>(rules: &'a RuleSet, access: &Access<'_>) -> AccessEvaluation<'a> {
	let matched_rule = select_access_rule(rules, access.method, access.path);
	let requirement =
		matched_rule.map(|rule| rule.requirement).unwrap_or(rules.default_requirement);
	let decision = decide(access, requirement);

	AccessEvaluation { decision, requirement, matched_rule }
}

fn decide(access: &Access<'_>, requirement: Requirement) -> AccessDecision {
	let is_write = access.method.map(|method| method.is_write()).unwrap_or(true);

	// A session-backed write without a valid token is denied before any role
	// check, even on public routes such as sign-out.
	if access.scheme == Scheme::Session
		&& is_write
		&& access.roles.is_some()
		&& !access.csrf_valid
	{
		return AccessDecision::AuthorizationDenied;
	}

	match requirement {
		Requirement::Public => AccessDecision::Permit,
		Requirement::RoleGated(allowed) => match access.roles {
			None => AccessDecision::AuthenticationRequired,
			Some(held) if held.iter().any(|role| allowed.contains(role)) =>
				AccessDecision::Permit,
			Some(_) => AccessDecision::AuthorizationDenied,
		},
	}
}

fn select_access_rule<'a>(
	rules: &'a RuleSet,
	method: Option<Method>,
	path: &str,
) -> Option<&'a AccessRule> {
	let method = method?;

	rules.rules.iter().find(|rule| rule.method == method && pattern_matches(rule.pattern, path))
}

/// Segment-wise match: `{id}` takes exactly one all-digit segment and a
/// trailing `**` takes any remainder, including none.
fn pattern_matches(pattern: &str, path: &str) -> bool {
	let mut pattern_segments = pattern.split('/').filter(|segment| !segment.is_empty());
	let mut path_segments = path.split('/').filter(|segment| !segment.is_empty());

	loop {
		match pattern_segments.next() {
			Some("**") => return true,
			Some("{id}") => {
				let Some(segment) = path_segments.next() else {
					return false;
				};

				if !segment.bytes().all(|byte| byte.is_ascii_digit()) {
					return false;
				}
			},
			Some(expected) =>
				if path_segments.next() != Some(expected) {
					return false;
				},
			None => return path_segments.next().is_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn access<'a>(
		scheme: Scheme,
		method: &str,
		path: &'a str,
		roles: Option<&'a [Role]>,
		csrf_valid: bool,
	) -> Access<'a> {
		Access { scheme, method: Method::parse(method), path, roles, csrf_valid }
	}

	fn decision(method: &str, path: &str, roles: Option<&[Role]>, csrf_valid: bool) -> AccessDecision {
		let rules = RuleSet::standard();
		let scheme = select_scheme(path);

		evaluate_access(&rules, &access(scheme, method, path, roles, csrf_valid)).decision
	}

	#[test]
	fn public_listings_beat_the_staff_wildcard() {
		assert_eq!(decision("GET", "/events", None, false), AccessDecision::Permit);
		assert_eq!(decision("GET", "/venues", None, false), AccessDecision::Permit);
		assert_eq!(decision("GET", "/", None, false), AccessDecision::Permit);

		assert_eq!(
			decision("GET", "/events/new", None, false),
			AccessDecision::AuthenticationRequired
		);
	}

	#[test]
	fn detail_routes_are_public_only_for_numeric_ids() {
		assert_eq!(decision("GET", "/events/7", None, false), AccessDecision::Permit);
		assert_eq!(
			decision("GET", "/events/abc", None, false),
			AccessDecision::AuthenticationRequired
		);
	}

	#[test]
	fn trailing_wildcard_also_matches_its_parent() {
		assert_eq!(decision("GET", "/api/events/3", None, false), AccessDecision::Permit);
		assert_eq!(decision("GET", "/api/venues/3/events", None, false), AccessDecision::Permit);
		assert_eq!(
			decision("GET", "/api/venues/3/next3events", None, false),
			AccessDecision::Permit
		);
	}

	#[test]
	fn attendees_can_share_but_not_manage_events() {
		let attendee: &[Role] = &[Role::Attendee];

		assert_eq!(
			decision("POST", "/events/3/share", Some(attendee), true),
			AccessDecision::Permit
		);
		assert_eq!(
			decision("GET", "/events/new", Some(attendee), false),
			AccessDecision::AuthorizationDenied
		);
		assert_eq!(
			decision("POST", "/events", Some(attendee), true),
			AccessDecision::AuthorizationDenied
		);
	}

	#[test]
	fn organisers_reach_venue_writes_through_the_default_rule() {
		let organiser: &[Role] = &[Role::Organiser];
		let attendee: &[Role] = &[Role::Attendee];

		assert_eq!(decision("POST", "/venues", Some(organiser), true), AccessDecision::Permit);
		assert_eq!(
			decision("DELETE", "/api/venues/1", Some(organiser), false),
			AccessDecision::Permit
		);
		assert_eq!(
			decision("POST", "/venues", Some(attendee), true),
			AccessDecision::AuthorizationDenied
		);
	}

	#[test]
	fn session_writes_need_a_csrf_token_regardless_of_role() {
		let admin: &[Role] = &[Role::Admin];

		assert_eq!(
			decision("POST", "/events", Some(admin), false),
			AccessDecision::AuthorizationDenied
		);
		assert_eq!(decision("POST", "/events", Some(admin), true), AccessDecision::Permit);
		assert_eq!(decision("GET", "/events", Some(admin), false), AccessDecision::Permit);

		// Sign-out is public yet still tokened once a session exists.
		assert_eq!(
			decision("POST", "/sign-out", Some(admin), false),
			AccessDecision::AuthorizationDenied
		);
		assert_eq!(decision("POST", "/sign-out", Some(admin), true), AccessDecision::Permit);
		assert_eq!(decision("POST", "/sign-out", None, false), AccessDecision::Permit);
	}

	#[test]
	fn header_scheme_requests_skip_the_csrf_check() {
		let admin: &[Role] = &[Role::Admin];

		assert_eq!(decision("DELETE", "/api/events/1", Some(admin), false), AccessDecision::Permit);
	}

	#[test]
	fn anonymous_writes_ask_for_authentication_first() {
		assert_eq!(
			decision("POST", "/events", None, false),
			AccessDecision::AuthenticationRequired
		);
		assert_eq!(
			decision("DELETE", "/api/events/1", None, false),
			AccessDecision::AuthenticationRequired
		);
	}

	#[test]
	fn unknown_methods_fall_back_to_the_default_requirement() {
		let admin: &[Role] = &[Role::Admin];
		let rules = RuleSet::standard();
		let evaluation = evaluate_access(
			&rules,
			&access(Scheme::Session, "TRACE", "/events", Some(admin), true),
		);

		assert!(evaluation.matched_rule.is_none());
		assert_eq!(evaluation.decision, AccessDecision::Permit);
		assert_eq!(
			decision("TRACE", "/events", Some(&[Role::Attendee]), true),
			AccessDecision::AuthorizationDenied
		);
	}

	#[test]
	fn scheme_follows_the_api_prefix() {
		assert_eq!(select_scheme("/api"), Scheme::ApiHeader);
		assert_eq!(select_scheme("/api/venues"), Scheme::ApiHeader);
		assert_eq!(select_scheme("/apiary"), Scheme::Session);
		assert_eq!(select_scheme("/"), Scheme::Session);
	}

	#[test]
	fn matched_rule_reports_the_winning_pattern() {
		let rules = RuleSet::standard();
		let evaluation = evaluate_access(
			&rules,
			&access(Scheme::Session, "GET", "/events/12", None, false),
		);
		let rule = evaluation.matched_rule.expect("expected rule match");

		assert_eq!(rule.pattern, "/events/{id}");
		assert_eq!(evaluation.requirement, Requirement::Public);
	}
}
