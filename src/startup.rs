use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionIssuer;
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{accounts, courses, health_check};
use crate::services::{AccountService, CourseService};
use crate::store::{AccountStore, CourseStore};

/// Everything the HTTP layer needs, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub students: AccountService,
    pub instructors: AccountService,
    pub admins: AccountService,
    pub courses: CourseService,
    pub sessions: SessionIssuer,
}

impl Services {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        courses: Arc<dyn CourseStore>,
        jwt: &JwtSettings,
        bcrypt_cost: u32,
    ) -> Self {
        let sessions = SessionIssuer::new(jwt);
        let account_service =
            |role| AccountService::new(role, accounts.clone(), sessions.clone(), bcrypt_cost);

        Self {
            students: account_service(Role::Student),
            instructors: account_service(Role::Instructor),
            admins: account_service(Role::Admin),
            courses: CourseService::new(courses),
            sessions,
        }
    }

    pub fn accounts(&self, role: Role) -> &AccountService {
        match role {
            Role::Student => &self.students,
            Role::Instructor => &self.instructors,
            Role::Admin => &self.admins,
        }
    }
}

/// One role's routes. `/me` is registered ahead of `/{id}`.
fn account_scope(role: Role, service: AccountService, sessions: SessionIssuer) -> actix_web::Scope {
    web::scope(role.scope())
        .app_data(web::Data::new(service))
        .route("/register", web::post().to(accounts::register))
        .route("/login", web::post().to(accounts::login))
        .service(
            web::resource("/me")
                .wrap(JwtMiddleware::new(sessions, &[role]))
                .route(web::get().to(accounts::me))
                .route(web::patch().to(accounts::update_me)),
        )
        .route("", web::get().to(accounts::list))
        .route("/{id}", web::get().to(accounts::get))
}

/// Course routes: reads are public, writes need an instructor or admin token.
fn course_scope(service: CourseService, sessions: SessionIssuer) -> actix_web::Scope {
    let editors = [Role::Instructor, Role::Admin];

    web::scope("/courses")
        .app_data(web::Data::new(service))
        .service(
            web::resource("")
                .wrap(JwtMiddleware::new(sessions.clone(), &editors).allow_anonymous_reads())
                .route(web::get().to(courses::list_courses))
                .route(web::post().to(courses::create_course)),
        )
        .service(
            web::resource("/{id}")
                .wrap(JwtMiddleware::new(sessions, &editors).allow_anonymous_reads())
                .route(web::get().to(courses::get_course))
                .route(web::patch().to(courses::update_course)),
        )
}

pub fn run(listener: TcpListener, services: Services) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        let mut app = App::new()
            .wrap(LoggerMiddleware)
            .route("/health_check", web::get().to(health_check));

        for role in Role::ALL {
            app = app.service(account_scope(
                role,
                services.accounts(role).clone(),
                services.sessions.clone(),
            ));
        }

        app.service(course_scope(
            services.courses.clone(),
            services.sessions.clone(),
        ))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
