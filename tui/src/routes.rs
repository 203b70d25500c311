use shared::types::Role;

/// Every screen the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Admin,
    Participant,
    Activities,
    RegisterActivity,
    ActivityTable,
    MyActivities,
    QrReader,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Login,
        Route::Register,
        Route::Admin,
        Route::Participant,
        Route::Activities,
        Route::RegisterActivity,
        Route::ActivityTable,
        Route::MyActivities,
        Route::QrReader,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/cadastro",
            Self::Admin => "/admin",
            Self::Participant => "/participante",
            Self::Activities => "/atividades",
            Self::RegisterActivity => "/cadastro-atividades",
            Self::ActivityTable => "/lista-atividades",
            Self::MyActivities => "/minhas-atividades",
            Self::QrReader => "/qr-reader",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Cadastro",
            Self::Admin => "Área do Administrador",
            Self::Participant => "Área do Participante",
            Self::Activities => "Atividades",
            Self::RegisterActivity => "Cadastrar Atividade",
            Self::ActivityTable => "Gerenciar Atividades",
            Self::MyActivities => "Minhas Atividades",
            Self::QrReader => "Leitor de QR Code",
        }
    }
}

/// Outcome of asking to show a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

/// One row of the authorization table.
struct Rule {
    anonymous: Access,
    user: Access,
    admin: Access,
}

const TO_LOGIN: Access = Access::Redirect(Route::Login);
const TO_PARTICIPANT: Access = Access::Redirect(Route::Participant);
const TO_ADMIN: Access = Access::Redirect(Route::Admin);

const fn rule(anonymous: Access, user: Access, admin: Access) -> Rule {
    Rule {
        anonymous,
        user,
        admin,
    }
}

fn rule_for(route: Route) -> Rule {
    use Access::Allow;

    match route {
        Route::Login | Route::Register => rule(Allow, TO_PARTICIPANT, TO_ADMIN),
        Route::Admin | Route::RegisterActivity | Route::ActivityTable => {
            rule(TO_LOGIN, TO_PARTICIPANT, Allow)
        }
        Route::Participant | Route::Activities | Route::MyActivities | Route::QrReader => {
            rule(TO_LOGIN, Allow, Allow)
        }
    }
}

/// Look up `(role, route)` in the authorization table. `None` is a visitor
/// without a session.
pub fn authorize(role: Option<Role>, route: Route) -> Access {
    let rule = rule_for(route);
    match role {
        None => rule.anonymous,
        Some(Role::User) => rule.user,
        Some(Role::Admin) => rule.admin,
    }
}

/// Follow redirects until an allowed route is reached.
pub fn resolve(role: Option<Role>, route: Route) -> Route {
    let mut current = route;
    for _ in 0..Route::ALL.len() {
        match authorize(role, current) {
            Access::Allow => return current,
            Access::Redirect(next) => current = next,
        }
    }
    home(role)
}

/// Landing route for a role.
pub fn home(role: Option<Role>) -> Route {
    match role {
        None => Route::Login,
        Some(Role::User) => Route::Participant,
        Some(Role::Admin) => Route::Admin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirects_land_in_one_hop() {
        for role in [None, Some(Role::User), Some(Role::Admin)] {
            for route in Route::ALL {
                if let Access::Redirect(next) = authorize(role, route) {
                    assert_eq!(authorize(role, next), Access::Allow, "{:?} -> {:?}", route, next);
                    assert_eq!(next, home(role));
                }
            }
        }
    }

    #[test]
    fn test_visitor_rows() {
        assert_eq!(authorize(None, Route::Login), Access::Allow);
        assert_eq!(authorize(None, Route::Register), Access::Allow);
        assert_eq!(authorize(None, Route::QrReader), TO_LOGIN);
        assert_eq!(authorize(Some(Role::User), Route::Register), TO_PARTICIPANT);
        assert_eq!(authorize(Some(Role::Admin), Route::Register), TO_ADMIN);
    }

    #[test]
    fn test_anonymous_only_sees_login_and_register() {
        for route in Route::ALL {
            let resolved = resolve(None, route);
            assert!(
                matches!(resolved, Route::Login | Route::Register),
                "{:?} -> {:?}",
                route,
                resolved
            );
        }
    }

    #[test]
    fn test_user_is_kept_out_of_admin_routes() {
        assert_eq!(resolve(Some(Role::User), Route::Admin), Route::Participant);
        assert_eq!(
            resolve(Some(Role::User), Route::ActivityTable),
            Route::Participant
        );
        assert_eq!(resolve(Some(Role::User), Route::QrReader), Route::QrReader);
    }

    #[test]
    fn test_admin_reaches_everything_but_login() {
        assert_eq!(resolve(Some(Role::Admin), Route::Login), Route::Admin);
        assert_eq!(
            resolve(Some(Role::Admin), Route::RegisterActivity),
            Route::RegisterActivity
        );
        assert_eq!(
            resolve(Some(Role::Admin), Route::MyActivities),
            Route::MyActivities
        );
    }

    #[test]
    fn test_every_resolution_is_allowed() {
        for role in [None, Some(Role::User), Some(Role::Admin)] {
            for route in Route::ALL {
                assert_eq!(authorize(role, resolve(role, route)), Access::Allow);
            }
        }
    }

    #[test]
    fn test_paths_roundtrip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/nada"), None);
    }
}
