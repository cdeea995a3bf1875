use actix_web::{web, HttpResponse};

use crate::domain::{CourseChanges, NewCourse};
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::CourseService;

/// GET /courses
pub async fn list_courses(
    params: web::Query<ListParams>,
    service: web::Data<CourseService>,
) -> Result<HttpResponse, AppError> {
    let page = service.list_courses(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /courses/{id}
pub async fn get_course(
    path: web::Path<i64>,
    service: web::Data<CourseService>,
) -> Result<HttpResponse, AppError> {
    let course = service.get_course(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(course))
}

/// POST /courses (instructor or admin token)
pub async fn create_course(
    form: web::Json<NewCourse>,
    service: web::Data<CourseService>,
) -> Result<HttpResponse, AppError> {
    let course = service.create_course(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(course))
}

/// PATCH /courses/{id} (instructor or admin token)
pub async fn update_course(
    path: web::Path<i64>,
    form: web::Json<CourseChanges>,
    service: web::Data<CourseService>,
) -> Result<HttpResponse, AppError> {
    let course = service
        .update_course(path.into_inner(), form.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(course))
}
