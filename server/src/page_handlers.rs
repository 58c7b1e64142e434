use std::convert::Infallible;
use warp::Reply;

static INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn index() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::html(INDEX_HTML))
}
