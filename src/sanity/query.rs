//! GROQ queries used by the pages

/// Every post slug, for the build-time path listing
pub const ALL_SLUGS: &str = r#"*[_type == "post"]{
  _id,
  slug { current }
}"#;

/// One post by `$slug`, author expanded and approved comments inlined
pub const POST_BY_SLUG: &str = r#"*[_type == "post" && slug.current == $slug][0]{
  _id,
  _createdAt,
  title,
  author->{
    name,
    image
  },
  'comments': *[
    _type == "comment" &&
    references(^._id) &&
    approved == true] | order(_createdAt asc),
  description,
  mainImage,
  slug,
  body
}"#;

/// Post summaries for the home page, newest first
pub const ALL_POSTS: &str = r#"*[_type == "post"] | order(_createdAt desc){
  _id,
  _createdAt,
  title,
  author->{
    name,
    image
  },
  description,
  mainImage,
  slug
}"#;
